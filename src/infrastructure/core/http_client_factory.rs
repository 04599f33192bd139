use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use std::time::Duration;

pub struct HttpClientFactory;

impl HttpClientFactory {
    /// Creates a new HTTP client with retry middleware.
    ///
    /// Only used for idempotent reads (prices, balances, job listings).
    /// Submissions and claims go through [`HttpClientFactory::create_plain_client`]
    /// so a timed-out POST is never replayed behind the caller's back.
    pub fn create_client(timeout: Duration) -> ClientWithMiddleware {
        // Retry policy:
        // - Exponential backoff
        // - Max 3 retries
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);

        ClientBuilder::new(Self::create_plain_client(timeout))
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build()
    }

    /// Creates a plain client with a per-request timeout and no retries.
    pub fn create_plain_client(timeout: Duration) -> Client {
        Client::builder()
            .pool_max_idle_per_host(5)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10).min(timeout))
            .build()
            .unwrap_or_else(|_| Client::new())
    }
}

/// Helper function to build a URL with query parameters.
/// reqwest-middleware's request builder does not expose `.query()`, so the
/// query string is encoded here and appended to the URL.
pub fn build_url_with_query<K, V>(base_url: &str, params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    if params.is_empty() {
        return base_url.to_string();
    }

    let query_string: String = params
        .iter()
        .map(|(k, v)| format!("{}={}", encode_component(k.as_ref()), encode_component(v.as_ref())))
        .collect::<Vec<_>>()
        .join("&");

    let separator = if base_url.contains('?') { '&' } else { '?' };
    format!("{}{}{}", base_url, separator, query_string)
}

/// Join a base URL and a path segment with exactly one slash between them.
pub fn join_path(base_url: &str, segment: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        segment.trim_start_matches('/')
    )
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
fn encode_component(s: &str) -> String {
    let mut encoded = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_with_query() {
        let url = build_url_with_query("https://api.binance.com/api/v3/ticker/price", &[("symbol", "BTCUSDT")]);
        assert_eq!(url, "https://api.binance.com/api/v3/ticker/price?symbol=BTCUSDT");

        let url = build_url_with_query("https://x/y?a=1", &[("b", "c d/e")]);
        assert_eq!(url, "https://x/y?a=1&b=c%20d%2Fe");

        let empty: [(&str, &str); 0] = [];
        assert_eq!(build_url_with_query("https://x", &empty), "https://x");
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("https://x/accounts/", "/0xabc"), "https://x/accounts/0xabc");
        assert_eq!(join_path("https://x/accounts", "0xabc"), "https://x/accounts/0xabc");
    }
}

use crate::domain::errors::DiscoveryError;
use crate::domain::ports::RemoteSource;
use crate::infrastructure::core::http_client_factory::HttpClientFactory;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Plain HTTP GET discovery source.
///
/// Deliberately built on the retry-free client: the resolver owns the retry
/// budget (fixed attempts, fixed pause) for discovery.
pub struct HttpRemoteSource {
    client: Client,
}

impl HttpRemoteSource {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: HttpClientFactory::create_plain_client(timeout),
        }
    }
}

#[async_trait]
impl RemoteSource for HttpRemoteSource {
    async fn fetch(&self, url: &str) -> Result<String, DiscoveryError> {
        debug!("HttpRemoteSource: GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DiscoveryError::Transport {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DiscoveryError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| DiscoveryError::Transport {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

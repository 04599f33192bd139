//! Acceptance checks applied to discovered addresses.

use crate::domain::ports::AddressVerifier;
use crate::infrastructure::core::http_client_factory::HttpClientFactory;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// `0x` followed by exactly 40 hex digits.
pub fn is_address(candidate: &str) -> bool {
    candidate
        .strip_prefix("0x")
        .or_else(|| candidate.strip_prefix("0X"))
        .is_some_and(|hex| hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

pub struct AddressFormatVerifier;

#[async_trait]
impl AddressVerifier for AddressFormatVerifier {
    async fn verify(&self, address: &str) -> Result<(), String> {
        if is_address(address) {
            Ok(())
        } else {
            Err(format!("'{}' is not a 20-byte hex address", address))
        }
    }
}

/// Confirms a contract is deployed by asking a JSON-RPC node for its code.
pub struct RpcCodeVerifier {
    client: Client,
    rpc_url: String,
}

impl RpcCodeVerifier {
    pub fn new(rpc_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: HttpClientFactory::create_plain_client(timeout),
            rpc_url: rpc_url.into(),
        }
    }
}

/// Empty bytecode means no contract at the address.
pub fn has_code(result: &str) -> bool {
    let code = result.trim().trim_start_matches("0x").trim_start_matches("0X");
    !code.is_empty() && code.chars().any(|c| c != '0')
}

#[async_trait]
impl AddressVerifier for RpcCodeVerifier {
    async fn verify(&self, address: &str) -> Result<(), String> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_getCode",
            "params": [address, "latest"],
        });

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("eth_getCode request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("eth_getCode returned HTTP {}", response.status()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| format!("eth_getCode returned malformed JSON: {}", e))?;

        if let Some(error) = body.get("error") {
            return Err(format!("eth_getCode error: {}", error));
        }

        let code = body.get("result").and_then(Value::as_str).unwrap_or_default();
        debug!("RpcCodeVerifier: {} has {} bytes of code", address, code.len().saturating_sub(2) / 2);
        if has_code(code) {
            Ok(())
        } else {
            Err(format!("no contract code at {}", address))
        }
    }
}

/// Runs verifiers in order; the first rejection wins.
pub struct VerifierChain {
    verifiers: Vec<Arc<dyn AddressVerifier>>,
}

impl VerifierChain {
    pub fn new(verifiers: Vec<Arc<dyn AddressVerifier>>) -> Self {
        Self { verifiers }
    }

    /// Format check, plus on-chain liveness when an RPC endpoint is configured.
    pub fn for_contracts(rpc_url: Option<&str>, timeout: Duration) -> Self {
        let mut verifiers: Vec<Arc<dyn AddressVerifier>> = vec![Arc::new(AddressFormatVerifier)];
        if let Some(url) = rpc_url {
            verifiers.push(Arc::new(RpcCodeVerifier::new(url, timeout)));
        }
        Self::new(verifiers)
    }
}

#[async_trait]
impl AddressVerifier for VerifierChain {
    async fn verify(&self, address: &str) -> Result<(), String> {
        for verifier in &self.verifiers {
            verifier.verify(address).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mock::RejectAllVerifier;

    #[test]
    fn test_address_format() {
        assert!(is_address("0x4a2e3b7c1d9f8e6a5b4c3d2e1f0a9b8c7d6e5f41"));
        assert!(!is_address("0x4a2e"));
        assert!(!is_address("4a2e3b7c1d9f8e6a5b4c3d2e1f0a9b8c7d6e5f41"));
        assert!(!is_address("0xZZ2e3b7c1d9f8e6a5b4c3d2e1f0a9b8c7d6e5f41"));
    }

    #[test]
    fn test_has_code() {
        assert!(!has_code("0x"));
        assert!(!has_code("0x0"));
        assert!(!has_code(""));
        assert!(has_code("0x6080604052"));
    }

    #[tokio::test]
    async fn test_chain_stops_at_first_rejection() {
        let chain = VerifierChain::new(vec![
            Arc::new(AddressFormatVerifier),
            Arc::new(RejectAllVerifier::new("offline")),
        ]);

        let bad_format = chain.verify("0x1234").await.unwrap_err();
        assert!(bad_format.contains("not a 20-byte hex address"));

        let offline = chain
            .verify("0x4a2e3b7c1d9f8e6a5b4c3d2e1f0a9b8c7d6e5f41")
            .await
            .unwrap_err();
        assert_eq!(offline, "offline");
    }
}

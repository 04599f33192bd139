use crate::domain::errors::SubmissionError;
use crate::domain::ports::ClaimService;
use crate::infrastructure::core::http_client_factory::HttpClientFactory;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value, json};
use std::time::Duration;

/// Predictoor reward claim endpoints (`POST {"wallet": ...}`).
pub struct PredictoorClaimClient {
    client: Client,
    api_key: Option<String>,
}

impl PredictoorClaimClient {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            client: HttpClientFactory::create_plain_client(timeout),
            api_key,
        }
    }
}

#[async_trait]
impl ClaimService for PredictoorClaimClient {
    async fn claim(&self, url: &str, wallet: &str) -> Result<Value, SubmissionError> {
        let mut request = self.client.post(url).json(&json!({ "wallet": wallet }));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| SubmissionError::Transport {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if status != reqwest::StatusCode::OK {
            return Err(SubmissionError::Rejected {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        // An empty or non-JSON 200 is still a successful claim.
        Ok(serde_json::from_str(&body).unwrap_or_else(|_| Value::Object(Map::new())))
    }
}

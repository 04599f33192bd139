use crate::domain::errors::SubmissionError;
use crate::domain::ports::{PredictionPayload, PredictionRelay};
use crate::infrastructure::core::http_client_factory::HttpClientFactory;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Gasless meta-transaction relay.
///
/// Success is HTTP 200 specifically; the body is optional JSON.
pub struct GelatoRelaySubmitter {
    client: Client,
    submit_url: String,
}

impl GelatoRelaySubmitter {
    pub fn new(submit_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: HttpClientFactory::create_plain_client(timeout),
            submit_url: submit_url.into(),
        }
    }
}

#[async_trait]
impl PredictionRelay for GelatoRelaySubmitter {
    async fn submit(&self, payload: &PredictionPayload) -> Result<Option<Value>, SubmissionError> {
        let response = self
            .client
            .post(&self.submit_url)
            .json(payload)
            .send()
            .await
            .map_err(|e| SubmissionError::Transport {
                url: self.submit_url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if status != reqwest::StatusCode::OK {
            return Err(SubmissionError::Rejected {
                url: self.submit_url.clone(),
                status: status.as_u16(),
                body,
            });
        }

        debug!("GelatoRelaySubmitter: accepted {} ({} bytes)", payload.feed, body.len());
        Ok(serde_json::from_str(&body).ok())
    }
}

use crate::domain::errors::{DiscoveryError, SubmissionError};
use crate::domain::notification::Severity;
use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A remote discovery source: fetch the raw body behind a URL.
///
/// Implementations map transport errors and non-2xx statuses onto
/// [`DiscoveryError`]; parsing is left to the caller.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, DiscoveryError>;
}

/// Acceptance check run on a discovered address before it is trusted.
#[async_trait]
pub trait AddressVerifier: Send + Sync {
    /// `Err` carries the rejection reason.
    async fn verify(&self, address: &str) -> Result<(), String>;
}

/// Best-effort operator notification. Delivery failures are swallowed.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, severity: Severity, message: &str);
}

#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn spot_price(&self, feed: &str) -> Result<Decimal>;
}

/// Payload handed to the gasless relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionPayload {
    pub feed: String,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub price: Option<Decimal>,
    pub wallet: String,
    pub timestamp: String,
}

#[async_trait]
pub trait PredictionRelay: Send + Sync {
    /// Returns the (optional) JSON body of a successful submission.
    async fn submit(&self, payload: &PredictionPayload) -> Result<Option<Value>, SubmissionError>;
}

#[async_trait]
pub trait ClaimService: Send + Sync {
    /// POST a claim for `wallet`; returns the (possibly empty) JSON body.
    async fn claim(&self, url: &str, wallet: &str) -> Result<Value, SubmissionError>;
}

#[async_trait]
pub trait BalanceSource: Send + Sync {
    /// Wallet balance in whole tokens.
    async fn balance(&self, wallet: &str) -> Result<Decimal>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredJob {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRequest {
    pub name: String,
    #[serde(rename = "taskSpec")]
    pub task_spec: TaskSpec,
    pub trigger: JobTrigger,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskSpec {
    #[serde(rename = "execAddress")]
    pub exec_address: String,
    #[serde(rename = "execData")]
    pub exec_data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobTrigger {
    /// Seconds between executions.
    pub interval: u64,
}

#[async_trait]
pub trait JobRegistry: Send + Sync {
    async fn list_jobs(&self) -> Result<Vec<RegisteredJob>>;
    /// Returns the id assigned to the new job, if the API reports one.
    async fn register(&self, job: &JobRequest) -> Result<Option<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_price_is_a_number() {
        let payload = PredictionPayload {
            feed: "ETH/USDT".to_string(),
            confidence: 0.64,
            direction: Some("UP".to_string()),
            price: Some(Decimal::new(312525, 2)),
            wallet: "0xabc".to_string(),
            timestamp: "2025-01-01T00:00:00+00:00".to_string(),
        };
        let value = serde_json::to_value(&payload).unwrap();

        assert_eq!(value["price"], json!(3125.25));
        assert_eq!(value["direction"], json!("UP"));
    }
}

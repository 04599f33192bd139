//! In-memory collaborators for tests.

use crate::domain::errors::{DiscoveryError, SubmissionError};
use crate::domain::notification::Severity;
use crate::domain::ports::{
    AddressVerifier, BalanceSource, ClaimService, JobRegistry, JobRequest, Notifier,
    PredictionPayload, PredictionRelay, PriceSource, RegisteredJob, RemoteSource,
};
use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Canned response for a [`ScriptedRemoteSource`].
#[derive(Debug, Clone)]
pub enum Scripted {
    Body(String),
    Status(u16),
    Transport(String),
}

/// Remote source replaying scripted responses per URL.
///
/// Each URL has a queue; once it drains, the last response repeats. URLs
/// without a script fail with a transport error.
#[derive(Default)]
pub struct ScriptedRemoteSource {
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRemoteSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, url: &str, response: Scripted) -> Self {
        self.push(url, response);
        self
    }

    pub fn push(&self, url: &str, response: Scripted) {
        if let Ok(mut scripts) = self.scripts.lock() {
            scripts.entry(url.to_string()).or_default().push_back(response);
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == url).count()
    }
}

#[async_trait]
impl RemoteSource for ScriptedRemoteSource {
    async fn fetch(&self, url: &str) -> Result<String, DiscoveryError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(url.to_string());
        }

        let next = self.scripts.lock().ok().and_then(|mut scripts| {
            let queue = scripts.get_mut(url)?;
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        });

        match next {
            Some(Scripted::Body(body)) => Ok(body),
            Some(Scripted::Status(status)) => Err(DiscoveryError::Status {
                url: url.to_string(),
                status,
            }),
            Some(Scripted::Transport(reason)) => Err(DiscoveryError::Transport {
                url: url.to_string(),
                reason,
            }),
            None => Err(DiscoveryError::Transport {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            }),
        }
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(Severity, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<(Severity, String)> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }

    pub fn with_severity(&self, severity: Severity) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|(s, _)| *s == severity)
            .map(|(_, m)| m)
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, severity: Severity, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push((severity, message.to_string()));
        }
    }
}

pub struct AcceptAllVerifier;

#[async_trait]
impl AddressVerifier for AcceptAllVerifier {
    async fn verify(&self, _address: &str) -> Result<(), String> {
        Ok(())
    }
}

pub struct RejectAllVerifier {
    reason: String,
}

impl RejectAllVerifier {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl AddressVerifier for RejectAllVerifier {
    async fn verify(&self, _address: &str) -> Result<(), String> {
        Err(self.reason.clone())
    }
}

/// Fixed prices per feed; unknown feeds fail.
#[derive(Default)]
pub struct FixedPriceSource {
    prices: HashMap<String, Decimal>,
}

impl FixedPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, feed: &str, price: Decimal) -> Self {
        self.prices.insert(feed.to_string(), price);
        self
    }
}

#[async_trait]
impl PriceSource for FixedPriceSource {
    async fn spot_price(&self, feed: &str) -> Result<Decimal> {
        self.prices
            .get(feed)
            .copied()
            .ok_or_else(|| anyhow!("no price for {}", feed))
    }
}

/// Relay that records payloads; feeds listed in `rejecting` are refused.
#[derive(Default)]
pub struct RecordingRelay {
    submitted: Mutex<Vec<PredictionPayload>>,
    rejecting: Vec<String>,
}

impl RecordingRelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting(mut self, feed: &str) -> Self {
        self.rejecting.push(feed.to_string());
        self
    }

    pub fn submitted(&self) -> Vec<PredictionPayload> {
        self.submitted.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PredictionRelay for RecordingRelay {
    async fn submit(&self, payload: &PredictionPayload) -> Result<Option<Value>, SubmissionError> {
        if self.rejecting.contains(&payload.feed) {
            return Err(SubmissionError::Rejected {
                url: "mock://relay".to_string(),
                status: 503,
                body: "relay unavailable".to_string(),
            });
        }
        if let Ok(mut submitted) = self.submitted.lock() {
            submitted.push(payload.clone());
        }
        Ok(None)
    }
}

/// Claim service with a canned outcome per URL; unknown URLs get `{}`.
#[derive(Default)]
pub struct ScriptedClaimService {
    outcomes: HashMap<String, std::result::Result<Value, u16>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedClaimService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn succeeding(mut self, url: &str, body: Value) -> Self {
        self.outcomes.insert(url.to_string(), Ok(body));
        self
    }

    pub fn failing(mut self, url: &str, status: u16) -> Self {
        self.outcomes.insert(url.to_string(), Err(status));
        self
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ClaimService for ScriptedClaimService {
    async fn claim(&self, url: &str, wallet: &str) -> Result<Value, SubmissionError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((url.to_string(), wallet.to_string()));
        }
        match self.outcomes.get(url) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(status)) => Err(SubmissionError::Rejected {
                url: url.to_string(),
                status: *status,
                body: "claim refused".to_string(),
            }),
            None => Ok(Value::Object(serde_json::Map::new())),
        }
    }
}

/// Returns queued balances in order; an empty queue is an error.
#[derive(Default)]
pub struct ScriptedBalanceSource {
    balances: Mutex<VecDeque<Decimal>>,
}

impl ScriptedBalanceSource {
    pub fn new(balances: impl IntoIterator<Item = Decimal>) -> Self {
        Self {
            balances: Mutex::new(balances.into_iter().collect()),
        }
    }
}

#[async_trait]
impl BalanceSource for ScriptedBalanceSource {
    async fn balance(&self, _wallet: &str) -> Result<Decimal> {
        self.balances
            .lock()
            .ok()
            .and_then(|mut b| b.pop_front())
            .ok_or_else(|| anyhow!("explorer unavailable"))
    }
}

/// In-memory job registry. Registrations for feeds in `rejecting` fail.
#[derive(Default)]
pub struct InMemoryJobRegistry {
    jobs: Mutex<Vec<RegisteredJob>>,
    registered: Mutex<Vec<JobRequest>>,
    rejecting: Vec<String>,
    unavailable: bool,
}

impl InMemoryJobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_job(self, name: &str) -> Self {
        if let Ok(mut jobs) = self.jobs.lock() {
            let id = format!("job-{}", jobs.len() + 1);
            jobs.push(RegisteredJob {
                id: Some(id),
                name: name.to_string(),
            });
        }
        self
    }

    pub fn rejecting(mut self, job_name: &str) -> Self {
        self.rejecting.push(job_name.to_string());
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    pub fn registered(&self) -> Vec<JobRequest> {
        self.registered.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl JobRegistry for InMemoryJobRegistry {
    async fn list_jobs(&self) -> Result<Vec<RegisteredJob>> {
        if self.unavailable {
            bail!("jobs API unavailable");
        }
        Ok(self.jobs.lock().map(|j| j.clone()).unwrap_or_default())
    }

    async fn register(&self, job: &JobRequest) -> Result<Option<String>> {
        if self.rejecting.contains(&job.name) {
            bail!("registration rejected for {}", job.name);
        }
        let mut jobs = self.jobs.lock().map_err(|_| anyhow!("job registry poisoned"))?;
        let id = format!("job-{}", jobs.len() + 1);
        jobs.push(RegisteredJob {
            id: Some(id.clone()),
            name: job.name.clone(),
        });
        drop(jobs);
        if let Ok(mut registered) = self.registered.lock() {
            registered.push(job.clone());
        }
        Ok(Some(id))
    }
}

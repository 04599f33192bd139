//! Discovery with fallback: remote sources in order, then the last cached
//! value, then the compiled-in default.

use crate::domain::discovery::{DiscoveredValue, Extraction};
use crate::domain::errors::DiscoveryError;
use crate::domain::notification::Severity;
use crate::domain::ports::{AddressVerifier, Notifier, RemoteSource};
use crate::infrastructure::persistence::DiscoveryCache;
use anyhow::{Result, bail};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Fixed-count, fixed-delay retries for transient failures of one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(3),
        }
    }
}

/// Everything needed to resolve one named fact.
#[derive(Debug, Clone)]
pub struct DiscoveryTarget {
    /// Used in logs and notifications ("Predictoor contract", "Gelato relayer").
    pub name: String,
    pub sources: Vec<String>,
    pub extraction: Extraction,
    pub cache: DiscoveryCache,
    pub fallback: String,
}

pub struct DiscoveryResolver {
    source: Arc<dyn RemoteSource>,
    notifier: Arc<dyn Notifier>,
    retry: RetryPolicy,
}

impl DiscoveryResolver {
    pub fn new(source: Arc<dyn RemoteSource>, notifier: Arc<dyn Notifier>, retry: RetryPolicy) -> Self {
        Self {
            source,
            notifier,
            retry,
        }
    }

    /// Fetch the raw body, retrying transport and status failures only.
    async fn fetch_with_retry(&self, url: &str) -> Result<String, DiscoveryError> {
        let attempts = self.retry.attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.source.fetch(url).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() && attempt < attempts => {
                    warn!(
                        "DiscoveryResolver: attempt {}/{} against {} failed: {}",
                        attempt, attempts, url, e
                    );
                    attempt += 1;
                    tokio::time::sleep(self.retry.delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn try_source(
        &self,
        target: &DiscoveryTarget,
        url: &str,
        verifier: Option<&dyn AddressVerifier>,
    ) -> Result<String, DiscoveryError> {
        let body = self.fetch_with_retry(url).await?;

        let payload: Value = serde_json::from_str(&body).map_err(|e| DiscoveryError::Malformed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let value = target
            .extraction
            .extract(&payload)
            .ok_or_else(|| DiscoveryError::MissingField {
                url: url.to_string(),
                field: target.extraction.field_name(),
            })?;

        if let Some(verifier) = verifier {
            verifier
                .verify(&value)
                .await
                .map_err(|reason| DiscoveryError::VerificationFailed {
                    url: url.to_string(),
                    value: value.clone(),
                    reason,
                })?;
        }

        Ok(value)
    }

    /// Resolve `target`. Only fails when the target has no fallback value.
    pub async fn resolve(
        &self,
        target: &DiscoveryTarget,
        verifier: Option<&dyn AddressVerifier>,
    ) -> Result<DiscoveredValue> {
        if target.fallback.trim().is_empty() {
            bail!("No fallback configured for {}", target.name);
        }

        for url in &target.sources {
            match self.try_source(target, url, verifier).await {
                Ok(value) => {
                    if let Err(e) = target.cache.store(&value) {
                        warn!("DiscoveryResolver: failed to cache {}: {}", target.name, e);
                    }
                    info!("DiscoveryResolver: {} = {} (from {})", target.name, value, url);
                    self.notifier
                        .notify(
                            Severity::Success,
                            &format!("Active {} discovered: {}", target.name, value),
                        )
                        .await;
                    return Ok(DiscoveredValue::remote(value));
                }
                Err(e) => {
                    warn!("DiscoveryResolver: {} source exhausted: {}", target.name, e);
                }
            }
        }

        if let Some(cached) = target.cache.load() {
            self.notifier
                .notify(
                    Severity::Warning,
                    &format!("Using cached {}: {}", target.name, cached),
                )
                .await;
            return Ok(DiscoveredValue::cached(cached));
        }

        debug!("DiscoveryResolver: no cache at {:?}", target.cache.path());
        self.notifier
            .notify(
                Severity::Critical,
                &format!("Using fallback {}: {}", target.name, target.fallback),
            )
            .await;
        Ok(DiscoveredValue::fallback(target.fallback.clone()))
    }
}

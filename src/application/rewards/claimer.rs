use crate::config::ClaimTarget;
use crate::domain::notification::Severity;
use crate::domain::ports::{ClaimService, Notifier};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Result of one token claim.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimOutcome {
    pub token: String,
    pub succeeded: bool,
    /// `earned` reported by the endpoint, when present and non-zero.
    pub earned: Option<f64>,
    pub detail: String,
}

impl ClaimOutcome {
    fn line(&self) -> String {
        match (self.succeeded, self.earned) {
            (true, Some(earned)) => format!("{} claim OK: earned {}", self.token, earned),
            (true, None) => format!("{} claim OK: no payout this round", self.token),
            (false, _) => format!("{} claim FAILED: {}", self.token, self.detail),
        }
    }
}

/// Non-zero numeric `earned` field, accepting numbers and numeric strings.
fn earned(body: &Value) -> Option<f64> {
    let value = match body.get("earned")? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    (value != 0.0).then_some(value)
}

pub struct RewardsClaimer {
    service: Arc<dyn ClaimService>,
    notifier: Arc<dyn Notifier>,
    targets: Vec<ClaimTarget>,
    pacing: Duration,
}

impl RewardsClaimer {
    pub fn new(
        service: Arc<dyn ClaimService>,
        notifier: Arc<dyn Notifier>,
        targets: Vec<ClaimTarget>,
        pacing: Duration,
    ) -> Self {
        Self {
            service,
            notifier,
            targets,
            pacing,
        }
    }

    /// Claim every configured token in order and send one summary.
    pub async fn claim_all(&self, wallet: &str) -> Vec<ClaimOutcome> {
        let mut outcomes = Vec::with_capacity(self.targets.len());

        for (i, target) in self.targets.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.pacing).await;
            }

            let outcome = match self.service.claim(&target.url, wallet).await {
                Ok(body) => ClaimOutcome {
                    token: target.token.clone(),
                    succeeded: true,
                    earned: earned(&body),
                    detail: body.to_string(),
                },
                Err(e) => {
                    warn!("RewardsClaimer: {} claim failed: {}", target.token, e);
                    ClaimOutcome {
                        token: target.token.clone(),
                        succeeded: false,
                        earned: None,
                        detail: e.to_string(),
                    }
                }
            };
            outcomes.push(outcome);
        }

        if outcomes.is_empty() {
            info!("RewardsClaimer: no claim endpoints configured");
            return outcomes;
        }

        let mut summary = vec![format!(
            "Claim run for {} at {}",
            wallet,
            chrono::Utc::now().to_rfc3339()
        )];
        summary.extend(outcomes.iter().map(ClaimOutcome::line));
        let severity = if outcomes.iter().all(|o| o.succeeded) {
            Severity::Success
        } else {
            Severity::Warning
        };
        self.notifier.notify(severity, &summary.join("\n")).await;

        outcomes
    }
}

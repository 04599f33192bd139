use crate::domain::errors::StoreError;
use crate::domain::notification::Severity;
use crate::domain::performance::{AccuracyEngine, ConfidenceAction, FeedAssessment};
use crate::domain::ports::Notifier;
use crate::infrastructure::persistence::{FeedConfigStore, PerformanceLogStore};
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// What one adjustment cycle did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdjustmentReport {
    pub assessments: Vec<FeedAssessment>,
    /// The feed configuration was rewritten.
    pub saved: bool,
}

impl AdjustmentReport {
    pub fn count(&self, action: ConfidenceAction) -> usize {
        self.assessments.iter().filter(|a| a.action == action).count()
    }

    pub fn disabled(&self) -> usize {
        self.assessments.iter().filter(|a| a.disabled_now).count()
    }
}

/// Reconciles the feed configuration against the performance log.
pub struct AccuracyAdjuster {
    engine: AccuracyEngine,
    log_store: Arc<PerformanceLogStore>,
    feed_store: Arc<FeedConfigStore>,
    notifier: Arc<dyn Notifier>,
}

impl AccuracyAdjuster {
    pub fn new(
        engine: AccuracyEngine,
        log_store: Arc<PerformanceLogStore>,
        feed_store: Arc<FeedConfigStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            engine,
            log_store,
            feed_store,
            notifier,
        }
    }

    /// Per-feed accuracy for every feed with enough samples.
    pub async fn report(&self) -> BTreeMap<String, f64> {
        let log = self.log_store.snapshot().await;
        self.engine.report(&log)
    }

    pub async fn run(&self) -> Result<AdjustmentReport> {
        let log = self.log_store.snapshot().await;

        let mut document = match self.feed_store.load() {
            Ok(Some(document)) => document,
            Ok(None) => {
                info!(
                    "AccuracyAdjuster: no feed configuration at {:?}, nothing to adjust",
                    self.feed_store.path()
                );
                return Ok(AdjustmentReport::default());
            }
            Err(e @ (StoreError::Parse { .. } | StoreError::Shape { .. })) => {
                // Never overwrite an operator file we could not read.
                self.notifier
                    .notify(
                        Severity::Warning,
                        &format!("Accuracy adjuster skipped: feed configuration unreadable ({})", e),
                    )
                    .await;
                return Ok(AdjustmentReport::default());
            }
            Err(e) => return Err(e).context("Failed to load feed configuration"),
        };

        let outcome = self
            .engine
            .adjust(&log, std::mem::take(&mut document.feeds));
        let summary = outcome.summary_message(self.engine.policy().skip_threshold);
        let changed = outcome.changed();
        document.feeds = outcome.feeds;

        if changed {
            self.feed_store
                .save(&document)
                .context("Failed to write feed configuration")?;
        }

        let report = AdjustmentReport {
            assessments: outcome.assessments,
            saved: changed,
        };
        info!(
            "AccuracyAdjuster: {} raised, {} lowered, {} unchanged, {} below minimum samples, {} disabled",
            report.count(ConfidenceAction::Raised),
            report.count(ConfidenceAction::Lowered),
            report.count(ConfidenceAction::Unchanged),
            report.count(ConfidenceAction::InsufficientData),
            report.disabled()
        );

        if let Some(message) = summary {
            warn!("AccuracyAdjuster: {}", message.replace('\n', " | "));
            self.notifier.notify(Severity::Warning, &message).await;
        }

        Ok(report)
    }
}

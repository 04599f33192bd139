use super::model::PredictionModel;
use crate::domain::errors::{StoreError, SubmissionError};
use crate::domain::feed::FeedDocument;
use crate::domain::notification::Severity;
use crate::domain::performance::PerformanceRecord;
use crate::domain::ports::{Notifier, PredictionPayload, PredictionRelay, PriceSource};
use crate::infrastructure::persistence::{FeedConfigStore, PerformanceLogStore};
use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PredictionReport {
    pub submitted: usize,
    pub skipped_disabled: usize,
    pub failed: usize,
}

/// Submits one prediction per enabled feed and records each accepted one.
pub struct PredictionAgent {
    feed_store: Arc<FeedConfigStore>,
    log_store: Arc<PerformanceLogStore>,
    prices: Arc<dyn PriceSource>,
    relay: Arc<dyn PredictionRelay>,
    notifier: Arc<dyn Notifier>,
    model: Box<dyn PredictionModel>,
    wallet: String,
    pacing: Duration,
}

impl PredictionAgent {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        feed_store: Arc<FeedConfigStore>,
        log_store: Arc<PerformanceLogStore>,
        prices: Arc<dyn PriceSource>,
        relay: Arc<dyn PredictionRelay>,
        notifier: Arc<dyn Notifier>,
        model: Box<dyn PredictionModel>,
        wallet: impl Into<String>,
        pacing: Duration,
    ) -> Self {
        Self {
            feed_store,
            log_store,
            prices,
            relay,
            notifier,
            model,
            wallet: wallet.into(),
            pacing,
        }
    }

    pub async fn run_cycle(&self) -> Result<PredictionReport> {
        let document = match self.feed_store.load_or_empty() {
            Ok(document) => document,
            Err(e @ (StoreError::Parse { .. } | StoreError::Shape { .. })) => {
                warn!("PredictionAgent: {}", e);
                self.notifier
                    .notify(
                        Severity::Warning,
                        &format!("Feed configuration unreadable, no predictions this cycle ({})", e),
                    )
                    .await;
                FeedDocument::empty()
            }
            Err(e) => return Err(e).context("Failed to load feed configuration"),
        };

        let mut report = PredictionReport::default();
        let mut first = true;

        for feed in document.known_feeds() {
            if !feed.enabled {
                report.skipped_disabled += 1;
                continue;
            }
            if !first {
                tokio::time::sleep(self.pacing).await;
            }
            first = false;

            let price = match self.prices.spot_price(&feed.identifier).await {
                Ok(price) => price,
                Err(e) => {
                    self.notifier
                        .notify(
                            Severity::Warning,
                            &format!("Price unavailable for {}, skipping: {:#}", feed.identifier, e),
                        )
                        .await;
                    report.failed += 1;
                    continue;
                }
            };

            let prediction = self.model.predict(feed, price);
            let timestamp = Utc::now().to_rfc3339();
            let payload = PredictionPayload {
                feed: feed.identifier.clone(),
                confidence: prediction.confidence,
                direction: Some(prediction.direction.as_str().to_string()),
                price: Some(price),
                wallet: self.wallet.clone(),
                timestamp: timestamp.clone(),
            };

            match self.relay.submit(&payload).await {
                Ok(_) => {
                    info!(
                        "PredictionAgent: {} {} @ {} (confidence {:.3})",
                        feed.identifier,
                        prediction.direction.as_str(),
                        price,
                        prediction.confidence
                    );
                    let mut record =
                        PerformanceRecord::new(feed.identifier.clone(), prediction.direction, timestamp);
                    record.price = Some(price);
                    record.confidence = Some(prediction.confidence);
                    if let Err(e) = self.log_store.append(&record).await {
                        warn!("PredictionAgent: failed to log {}: {}", feed.identifier, e);
                    }
                    report.submitted += 1;
                }
                Err(e) => {
                    let detail = match &e {
                        SubmissionError::Rejected { status, .. } => format!("HTTP {}", status),
                        SubmissionError::Transport { reason, .. } => reason.clone(),
                    };
                    warn!("PredictionAgent: {}", e);
                    self.notifier
                        .notify(
                            Severity::Warning,
                            &format!("Submission failed for {}: {}", feed.identifier, detail),
                        )
                        .await;
                    report.failed += 1;
                }
            }
        }

        info!(
            "PredictionAgent: cycle done ({} submitted, {} disabled, {} failed)",
            report.submitted, report.skipped_disabled, report.failed
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::agents::model::Prediction;
    use crate::domain::feed::Feed;
    use crate::domain::performance::Direction;
    use crate::infrastructure::mock::{FixedPriceSource, RecordingNotifier, RecordingRelay};
    use crate::infrastructure::persistence::json_file::test_support::unique_temp_dir;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use std::fs;

    struct AlwaysUp;

    impl PredictionModel for AlwaysUp {
        fn predict(&self, feed: &Feed, _price: Decimal) -> Prediction {
            Prediction {
                direction: Direction::Up,
                confidence: feed.confidence,
            }
        }
    }

    #[tokio::test]
    async fn test_cycle_submits_enabled_feeds_in_order() {
        let dir = unique_temp_dir("predictor_cycle");
        fs::write(
            dir.join("feeds.json"),
            json!([
                {"pair": "BTC/USDT", "confidence": 0.7},
                {"pair": "ETH/USDT", "confidence": 0.6, "enabled": false},
                {"pair": "SOL/USDT", "confidence": 0.65},
                {"pair": "DOGE/USDT", "confidence": 0.6}
            ])
            .to_string(),
        )
        .unwrap();

        let log_store = Arc::new(PerformanceLogStore::new(dir.join("performance_log.json")));
        let relay = Arc::new(RecordingRelay::new().rejecting("SOL/USDT"));
        let notifier = Arc::new(RecordingNotifier::new());
        let prices = FixedPriceSource::new()
            .with_price("BTC/USDT", dec!(65000.5))
            .with_price("SOL/USDT", dec!(150));

        let agent = PredictionAgent::new(
            Arc::new(FeedConfigStore::new(dir.join("feeds.json"))),
            log_store.clone(),
            Arc::new(prices),
            relay.clone(),
            notifier.clone(),
            Box::new(AlwaysUp),
            "0xwallet",
            Duration::from_millis(1),
        );

        let report = agent.run_cycle().await.unwrap();

        assert_eq!(
            report,
            PredictionReport {
                submitted: 1,
                skipped_disabled: 1,
                failed: 2
            }
        );
        let submitted = relay.submitted();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].feed, "BTC/USDT");
        assert_eq!(submitted[0].direction.as_deref(), Some("UP"));
        assert_eq!(submitted[0].price, Some(dec!(65000.5)));
        assert_eq!(submitted[0].wallet, "0xwallet");

        let log = log_store.snapshot().await;
        assert_eq!(log.records("BTC/USDT").len(), 1);
        assert!(log.records("SOL/USDT").is_empty());
        assert_eq!(notifier.with_severity(Severity::Warning).len(), 2);
        fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn test_unreadable_configuration_submits_nothing() {
        let dir = unique_temp_dir("predictor_corrupt");
        fs::write(dir.join("feeds.json"), "[{\"pair\": ").unwrap();
        let relay = Arc::new(RecordingRelay::new());
        let notifier = Arc::new(RecordingNotifier::new());

        let agent = PredictionAgent::new(
            Arc::new(FeedConfigStore::new(dir.join("feeds.json"))),
            Arc::new(PerformanceLogStore::new(dir.join("performance_log.json"))),
            Arc::new(FixedPriceSource::new()),
            relay.clone(),
            notifier.clone(),
            Box::new(AlwaysUp),
            "0xwallet",
            Duration::from_millis(1),
        );

        let report = agent.run_cycle().await.unwrap();

        assert_eq!(report, PredictionReport::default());
        assert!(relay.submitted().is_empty());
        let warnings = notifier.with_severity(Severity::Warning);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("Feed configuration unreadable"));
        fs::remove_dir_all(dir).ok();
    }
}

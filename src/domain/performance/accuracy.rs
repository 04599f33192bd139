//! Accuracy engine.
//!
//! The accuracy metric is a placeholder: it is the fraction of a feed's
//! records whose direction is `UP`. The log carries no realized outcome, so
//! this measures directional bias rather than correctness. It is kept as-is
//! until an outcome-labelling source exists.

use super::record::{Direction, PerformanceLog, PerformanceRecord};
use crate::domain::feed::{Feed, FeedRecord, clamp_confidence, round_confidence};
use std::collections::BTreeMap;

/// Tunables for one accuracy cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccuracyPolicy {
    pub minimum_sample_size: usize,
    pub skip_threshold: f64,
    pub raise_threshold: f64,
    pub lower_threshold: f64,
    pub step: f64,
}

impl Default for AccuracyPolicy {
    fn default() -> Self {
        Self {
            minimum_sample_size: 5,
            skip_threshold: 0.40,
            raise_threshold: 0.65,
            lower_threshold: 0.45,
            step: 0.03,
        }
    }
}

/// Fraction of records pointing `UP`. Zero for an empty slice.
pub fn placeholder_accuracy(records: &[PerformanceRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    let ups = records
        .iter()
        .filter(|record| record.direction == Direction::Up)
        .count();
    ups as f64 / records.len() as f64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceAction {
    Raised,
    Lowered,
    Unchanged,
    /// Fewer records than the minimum sample size.
    InsufficientData,
    /// No new records since the last adjustment.
    AlreadyAssessed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedAssessment {
    pub identifier: String,
    pub samples: usize,
    pub accuracy: Option<f64>,
    pub old_confidence: f64,
    pub new_confidence: f64,
    pub action: ConfidenceAction,
    /// The feed went from enabled to disabled in this cycle.
    pub disabled_now: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdjustmentOutcome {
    /// Updated feed list, in the original order.
    pub feeds: Vec<FeedRecord>,
    pub assessments: Vec<FeedAssessment>,
}

impl AdjustmentOutcome {
    pub fn newly_disabled(&self) -> impl Iterator<Item = &FeedAssessment> {
        self.assessments.iter().filter(|a| a.disabled_now)
    }

    /// Whether anything in the feed list differs from the input.
    pub fn changed(&self) -> bool {
        self.assessments.iter().any(|a| {
            a.disabled_now
                || matches!(
                    a.action,
                    ConfidenceAction::Raised | ConfidenceAction::Lowered | ConfidenceAction::Unchanged
                )
        })
    }

    /// One batched message for every feed disabled in this cycle.
    pub fn summary_message(&self, skip_threshold: f64) -> Option<String> {
        let lines: Vec<String> = self
            .newly_disabled()
            .map(|a| {
                format!(
                    "Feed {} disabled. Accuracy {:.2} < {:.2}",
                    a.identifier,
                    a.accuracy.unwrap_or_default(),
                    skip_threshold
                )
            })
            .collect();

        if lines.is_empty() {
            None
        } else {
            Some(format!(
                "Accuracy adjuster flagged issues:\n{}",
                lines.join("\n")
            ))
        }
    }
}

pub struct AccuracyEngine {
    policy: AccuracyPolicy,
}

impl AccuracyEngine {
    pub fn new(policy: AccuracyPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &AccuracyPolicy {
        &self.policy
    }

    /// Accuracy for a feed, or `None` below the minimum sample size.
    pub fn accuracy(&self, records: &[PerformanceRecord]) -> Option<f64> {
        if records.len() < self.policy.minimum_sample_size {
            return None;
        }
        Some(placeholder_accuracy(records))
    }

    /// Accuracy of every feed in the log that has enough samples.
    pub fn report(&self, log: &PerformanceLog) -> BTreeMap<String, f64> {
        log.feeds()
            .filter_map(|(feed, records)| self.accuracy(records).map(|acc| (feed.clone(), acc)))
            .collect()
    }

    /// Apply the decision rule to one feed in place.
    pub fn assess(&self, feed: &mut Feed, records: &[PerformanceRecord]) -> FeedAssessment {
        let samples = records.len();
        let old_confidence = feed.confidence;
        let mut assessment = FeedAssessment {
            identifier: feed.identifier.clone(),
            samples,
            accuracy: None,
            old_confidence,
            new_confidence: old_confidence,
            action: ConfidenceAction::InsufficientData,
            disabled_now: false,
        };

        let Some(accuracy) = self.accuracy(records) else {
            return assessment;
        };
        assessment.accuracy = Some(accuracy);

        if feed.adjusted_at_samples.is_some_and(|seen| samples <= seen) {
            assessment.action = ConfidenceAction::AlreadyAssessed;
            return assessment;
        }

        let policy = &self.policy;
        let (confidence, action) = if accuracy > policy.raise_threshold {
            (
                round_confidence(clamp_confidence(old_confidence + policy.step)),
                ConfidenceAction::Raised,
            )
        } else if accuracy < policy.lower_threshold {
            (
                round_confidence(clamp_confidence(old_confidence - policy.step)),
                ConfidenceAction::Lowered,
            )
        } else {
            (old_confidence, ConfidenceAction::Unchanged)
        };

        feed.confidence = confidence;
        feed.adjusted_at_samples = Some(samples);
        assessment.new_confidence = confidence;
        assessment.action = action;

        // Independent of the confidence branch above.
        if accuracy < policy.skip_threshold && feed.enabled {
            feed.enabled = false;
            assessment.disabled_now = true;
        }

        assessment
    }

    /// Run one accuracy cycle over the whole feed list.
    pub fn adjust(&self, log: &PerformanceLog, feeds: Vec<FeedRecord>) -> AdjustmentOutcome {
        let mut assessments = Vec::new();
        let feeds = feeds
            .into_iter()
            .map(|record| match record {
                FeedRecord::Known(mut feed) => {
                    let records = log.records(&feed.identifier);
                    assessments.push(self.assess(&mut feed, records));
                    FeedRecord::Known(feed)
                }
                other => other,
            })
            .collect();

        AdjustmentOutcome { feeds, assessments }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::feed::FeedDocument;
    use serde_json::json;

    fn log_with(feed: &str, directions: &[Direction]) -> PerformanceLog {
        let mut log = PerformanceLog::new();
        for (i, direction) in directions.iter().enumerate() {
            log.push(PerformanceRecord::new(feed, *direction, format!("t{}", i)));
        }
        log
    }

    fn feeds(value: serde_json::Value) -> Vec<FeedRecord> {
        FeedDocument::from_value(value).unwrap().feeds
    }

    fn only_feed(outcome: &AdjustmentOutcome) -> &Feed {
        outcome.feeds[0].as_feed().unwrap()
    }

    use Direction::{Down, Up};

    #[test]
    fn test_high_accuracy_raises_confidence() {
        let engine = AccuracyEngine::new(AccuracyPolicy::default());
        let log = log_with("BTC/USDT", &[Up, Up, Up, Up, Down]);

        let outcome = engine.adjust(&log, feeds(json!([{"pair": "BTC/USDT", "confidence": 0.70}])));
        let feed = only_feed(&outcome);

        assert_eq!(feed.confidence, 0.73);
        assert!(feed.enabled);
        assert!(outcome.summary_message(0.40).is_none());
    }

    #[test]
    fn test_low_accuracy_lowers_and_disables() {
        let engine = AccuracyEngine::new(AccuracyPolicy::default());
        let log = log_with("ETH/USDT", &[Down, Down, Down, Down, Up]);

        let outcome = engine.adjust(&log, feeds(json!([{"pair": "ETH/USDT", "confidence": 0.70}])));
        let feed = only_feed(&outcome);

        assert_eq!(feed.confidence, 0.67);
        assert!(!feed.enabled);
        let message = outcome.summary_message(0.40).unwrap();
        assert!(message.contains("ETH/USDT"));
        assert!(message.contains("0.20"));
    }

    #[test]
    fn test_lowered_without_disable_at_skip_boundary() {
        // 2 of 5 UP = 0.40: lowered (< 0.45) but not disabled (not < 0.40)
        let engine = AccuracyEngine::new(AccuracyPolicy::default());
        let log = log_with("SOL/USDT", &[Up, Up, Down, Down, Down]);

        let outcome = engine.adjust(&log, feeds(json!([{"pair": "SOL/USDT", "confidence": 0.6}])));
        let feed = only_feed(&outcome);

        assert_eq!(feed.confidence, 0.57);
        assert!(feed.enabled);
    }

    #[test]
    fn test_neutral_accuracy_keeps_confidence() {
        let engine = AccuracyEngine::new(AccuracyPolicy::default());
        // 3 of 6 UP = 0.5
        let log = log_with("BNB/USDT", &[Up, Down, Up, Down, Up, Down]);

        let outcome = engine.adjust(&log, feeds(json!([{"pair": "BNB/USDT", "confidence": 0.8123}])));
        assert_eq!(only_feed(&outcome).confidence, 0.8123);
        assert_eq!(outcome.assessments[0].action, ConfidenceAction::Unchanged);
    }

    #[test]
    fn test_insufficient_samples_leave_feed_untouched() {
        let engine = AccuracyEngine::new(AccuracyPolicy::default());
        let log = log_with("BTC/USDT", &[Down, Down, Down, Down]);

        let input = feeds(json!([{"pair": "BTC/USDT", "confidence": 0.7}]));
        let outcome = engine.adjust(&log, input.clone());

        assert_eq!(outcome.feeds, input);
        assert_eq!(outcome.assessments[0].action, ConfidenceAction::InsufficientData);
        assert!(!outcome.changed());
    }

    #[test]
    fn test_confidence_is_clamped_at_bounds() {
        let engine = AccuracyEngine::new(AccuracyPolicy::default());
        let ups = log_with("A/B", &[Up; 5]);
        let downs = log_with("A/B", &[Down; 5]);

        let raised = engine.adjust(&ups, feeds(json!([{"pair": "A/B", "confidence": 0.94}])));
        assert_eq!(only_feed(&raised).confidence, 0.95);

        let lowered = engine.adjust(&downs, feeds(json!([{"pair": "A/B", "confidence": 0.51}])));
        assert_eq!(only_feed(&lowered).confidence, 0.5);
    }

    #[test]
    fn test_second_run_on_same_log_is_a_no_op() {
        let engine = AccuracyEngine::new(AccuracyPolicy::default());
        let log = log_with("ETH/USDT", &[Down, Down, Down, Down, Up]);

        let first = engine.adjust(&log, feeds(json!([{"pair": "ETH/USDT", "confidence": 0.7}])));
        let second = engine.adjust(&log, first.feeds.clone());

        assert_eq!(second.feeds, first.feeds);
        assert!(!second.changed());
        assert!(second.summary_message(0.40).is_none());
    }

    #[test]
    fn test_log_growth_triggers_new_adjustment() {
        let engine = AccuracyEngine::new(AccuracyPolicy::default());
        let mut log = log_with("BTC/USDT", &[Up; 5]);

        let first = engine.adjust(&log, feeds(json!([{"pair": "BTC/USDT", "confidence": 0.7}])));
        log.push(PerformanceRecord::new("BTC/USDT", Up, "t5".to_string()));
        let second = engine.adjust(&log, first.feeds);

        assert_eq!(only_feed(&second).confidence, 0.76);
        assert_eq!(only_feed(&second).adjusted_at_samples, Some(6));
    }

    #[test]
    fn test_unidentified_records_pass_through_in_order() {
        let engine = AccuracyEngine::new(AccuracyPolicy::default());
        let log = log_with("BTC/USDT", &[Up; 5]);

        let outcome = engine.adjust(
            &log,
            feeds(json!([{"comment": "header"}, {"pair": "BTC/USDT", "confidence": 0.7}])),
        );

        assert_eq!(outcome.feeds[0], FeedRecord::Unrecognized(json!({"comment": "header"})));
        assert_eq!(outcome.feeds[1].as_feed().unwrap().confidence, 0.73);
        assert_eq!(outcome.assessments.len(), 1);
    }

    #[test]
    fn test_report_only_includes_sufficient_samples() {
        let engine = AccuracyEngine::new(AccuracyPolicy::default());
        let mut log = log_with("BTC/USDT", &[Up, Up, Down, Down]);
        for i in 0..5 {
            log.push(PerformanceRecord::new("ETH/USDT", Up, format!("e{}", i)));
        }

        let report = engine.report(&log);
        assert_eq!(report.len(), 1);
        assert_eq!(report.get("ETH/USDT"), Some(&1.0));
    }
}

pub mod accuracy;
pub mod record;

pub use accuracy::{AccuracyEngine, AccuracyPolicy, AdjustmentOutcome, ConfidenceAction, FeedAssessment};
pub use record::{Direction, PerformanceLog, PerformanceRecord};

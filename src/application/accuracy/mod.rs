pub mod adjuster;

pub use adjuster::{AccuracyAdjuster, AdjustmentReport};

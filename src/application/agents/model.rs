//! Prediction models.
//!
//! The only model today is a placeholder that guesses a direction at random
//! and jitters the feed's configured confidence.

use crate::domain::feed::{Feed, clamp_confidence, round_confidence};
use crate::domain::performance::Direction;
use rand::Rng;
use rust_decimal::Decimal;

/// Maximum distance of the model's confidence from the feed's configured one.
pub const CONFIDENCE_JITTER: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub direction: Direction,
    pub confidence: f64,
}

pub trait PredictionModel: Send + Sync {
    fn predict(&self, feed: &Feed, price: Decimal) -> Prediction;
}

pub struct RandomModel;

impl PredictionModel for RandomModel {
    fn predict(&self, feed: &Feed, _price: Decimal) -> Prediction {
        let mut rng = rand::rng();
        let direction = if rng.random_bool(0.5) {
            Direction::Up
        } else {
            Direction::Down
        };
        let jitter = rng.random_range(-CONFIDENCE_JITTER..=CONFIDENCE_JITTER);

        Prediction {
            direction,
            confidence: round_confidence(clamp_confidence(feed.confidence + jitter)),
        }
    }
}

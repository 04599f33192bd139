pub mod model;
pub mod predictor;

pub use model::{PredictionModel, RandomModel};
pub use predictor::{PredictionAgent, PredictionReport};

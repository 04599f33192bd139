pub mod claim_client;

pub use claim_client::PredictoorClaimClient;

pub mod jobs;
pub mod relay;

pub use jobs::GelatoJobsClient;
pub use relay::GelatoRelaySubmitter;

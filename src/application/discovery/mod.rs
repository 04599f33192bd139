pub mod resolver;
pub mod service;

pub use resolver::{DiscoveryResolver, DiscoveryTarget, RetryPolicy};
pub use service::{ActiveEndpoints, DiscoveryService};

pub mod discovery_cache;
pub mod feed_config_store;
pub mod json_file;
pub mod performance_log_store;
pub mod profit_history_store;

pub use discovery_cache::DiscoveryCache;
pub use feed_config_store::FeedConfigStore;
pub use performance_log_store::PerformanceLogStore;
pub use profit_history_store::{ProfitEntry, ProfitHistoryStore};

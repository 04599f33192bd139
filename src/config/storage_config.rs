//! Flat-file storage locations.

use super::parse_string;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct StorageEnvConfig {
    pub contract_cache_path: PathBuf,
    pub relayer_cache_path: PathBuf,
    pub feeds_path: PathBuf,
    pub performance_log_path: PathBuf,
    pub profit_log_path: PathBuf,
}

impl Default for StorageEnvConfig {
    fn default() -> Self {
        Self {
            contract_cache_path: PathBuf::from("active_contracts.json"),
            relayer_cache_path: PathBuf::from("gelato_relayer.json"),
            feeds_path: PathBuf::from("feeds.json"),
            performance_log_path: PathBuf::from("performance_log.json"),
            profit_log_path: PathBuf::from("profit_log.json"),
        }
    }
}

impl StorageEnvConfig {
    pub fn from_env() -> Self {
        let path = |key: &str, default: &PathBuf| {
            PathBuf::from(parse_string(key, &default.to_string_lossy()))
        };
        let defaults = Self::default();

        Self {
            contract_cache_path: path("CONTRACT_CACHE_PATH", &defaults.contract_cache_path),
            relayer_cache_path: path("RELAYER_CACHE_PATH", &defaults.relayer_cache_path),
            feeds_path: path("FEEDS_PATH", &defaults.feeds_path),
            performance_log_path: path("PERFORMANCE_LOG_PATH", &defaults.performance_log_path),
            profit_log_path: path("PROFIT_LOG_PATH", &defaults.profit_log_path),
        }
    }
}

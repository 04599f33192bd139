use super::json_file::{read_json, write_json_atomic};
use crate::domain::errors::StoreError;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Single-value cache for a discovered address, stored as `{"<key>": "<value>"}`.
///
/// Every successful discovery overwrites the file. An unreadable cache is
/// reported and treated as absent.
#[derive(Debug, Clone)]
pub struct DiscoveryCache {
    path: PathBuf,
    key: String,
}

impl DiscoveryCache {
    pub fn new(path: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            key: key.into(),
        }
    }

    /// Cache for the prediction contract (`{"predictoor_contract": ...}`).
    pub fn contract(path: impl Into<PathBuf>) -> Self {
        Self::new(path, "predictoor_contract")
    }

    /// Cache for the relayer (`{"relayer": ...}`).
    pub fn relayer(path: impl Into<PathBuf>) -> Self {
        Self::new(path, "relayer")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Option<String> {
        match read_json(&self.path) {
            Ok(Some(document)) => {
                let value = document
                    .get(&self.key)
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string);
                if value.is_none() {
                    warn!(
                        "DiscoveryCache: {:?} has no usable '{}' entry",
                        self.path, self.key
                    );
                }
                value
            }
            Ok(None) => None,
            Err(e) => {
                warn!("DiscoveryCache: treating unreadable cache as absent: {}", e);
                None
            }
        }
    }

    pub fn store(&self, value: &str) -> Result<(), StoreError> {
        let mut document = Map::new();
        document.insert(self.key.clone(), Value::String(value.to_string()));
        write_json_atomic(&self.path, &Value::Object(document))?;
        info!("DiscoveryCache: saved {} to {:?}", self.key, self.path);
        Ok(())
    }
}

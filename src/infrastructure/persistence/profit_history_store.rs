use super::json_file::{read_json, write_json_atomic};
use crate::domain::errors::StoreError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::warn;

/// One daily balance observation. Amounts are stored as JSON numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitEntry {
    pub date: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub profit: Decimal,
}

/// Profit history stored as a JSON array of [`ProfitEntry`].
#[derive(Debug, Clone)]
pub struct ProfitHistoryStore {
    path: PathBuf,
}

impl ProfitHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Unreadable history degrades to an empty one.
    pub fn load(&self) -> Vec<ProfitEntry> {
        match read_json(&self.path) {
            Ok(Some(value)) => match serde_json::from_value::<Vec<ProfitEntry>>(value) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("ProfitHistoryStore: ignoring malformed history {:?}: {}", self.path, e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("ProfitHistoryStore: {}; starting empty", e);
                Vec::new()
            }
        }
    }

    /// Record `balance` for `date`; profit is measured against the previous
    /// entry, so the first entry's profit is the whole balance.
    pub fn record(&self, date: String, balance: Decimal) -> Result<ProfitEntry, StoreError> {
        let mut history = self.load();
        let previous = history.last().map_or(Decimal::ZERO, |entry| entry.balance);
        let profit = balance - previous;

        let entry = ProfitEntry {
            date,
            balance,
            profit,
        };
        history.push(entry.clone());

        let value = serde_json::to_value(&history).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })?;
        write_json_atomic(&self.path, &value)?;
        Ok(entry)
    }

    pub fn latest(&self) -> Option<ProfitEntry> {
        self.load().pop()
    }
}

use super::json_file::{quarantine, read_json, write_json_atomic};
use crate::domain::errors::StoreError;
use crate::domain::performance::{PerformanceLog, PerformanceRecord};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Performance log: `{"<feed>": [record, ...], ...}` in one JSON document.
///
/// Appends are read-modify-write of the whole document. Within the process
/// they are serialised behind a mutex and every write is an atomic rename,
/// so a concurrent snapshot sees either the old or the new document.
/// An append never overwrites a log it could not parse: the unreadable file
/// is moved aside first, and an I/O failure fails the append.
#[derive(Debug)]
pub struct PerformanceLogStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl PerformanceLogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Corrupt or non-object content degrades to an empty document.
    fn read_for_snapshot(&self) -> Map<String, Value> {
        match read_json(&self.path) {
            Ok(Some(Value::Object(map))) => map,
            Ok(Some(_)) => {
                warn!("PerformanceLogStore: {:?} is not an object, starting empty", self.path);
                Map::new()
            }
            Ok(None) => Map::new(),
            Err(e) => {
                warn!("PerformanceLogStore: {}; starting empty", e);
                Map::new()
            }
        }
    }

    fn read_for_append(&self) -> Result<Map<String, Value>, StoreError> {
        let reason = match read_json(&self.path) {
            Ok(Some(Value::Object(map))) => return Ok(map),
            Ok(None) => return Ok(Map::new()),
            Ok(Some(_)) => "not an object".to_string(),
            Err(e @ StoreError::Parse { .. }) => e.to_string(),
            Err(e) => return Err(e),
        };

        let aside = quarantine(&self.path)?;
        warn!(
            "PerformanceLogStore: {:?} unreadable ({}), moved to {:?}; starting a new log",
            self.path, reason, aside
        );
        Ok(Map::new())
    }

    pub async fn append(&self, record: &PerformanceRecord) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;

        let mut raw = self.read_for_append()?;
        let entry = serde_json::to_value(record).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })?;

        let slot = raw
            .entry(record.feed_identifier.clone())
            .or_insert_with(|| Value::Array(Vec::new()));
        match slot {
            Value::Array(entries) => entries.push(entry),
            other => {
                warn!(
                    "PerformanceLogStore: replacing non-list entry for {}",
                    record.feed_identifier
                );
                *other = Value::Array(vec![entry]);
            }
        }

        write_json_atomic(&self.path, &Value::Object(raw))?;
        debug!(
            "PerformanceLogStore: appended {} {} for {}",
            record.direction.as_str(),
            record.timestamp,
            record.feed_identifier
        );
        Ok(())
    }

    /// Consistent read-only snapshot for the accuracy engine.
    pub async fn snapshot(&self) -> PerformanceLog {
        let _guard = self.lock.lock().await;
        let (log, skipped) = PerformanceLog::from_raw(&self.read_for_snapshot());
        if skipped > 0 {
            warn!(
                "PerformanceLogStore: skipped {} unreadable record(s) in {:?}",
                skipped, self.path
            );
        }
        log
    }
}

#[cfg(test)]
mod tests {
    use super::super::json_file::test_support::unique_temp_dir;
    use super::*;
    use crate::domain::performance::Direction;
    use std::fs;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_append_keeps_order_and_unknown_records() {
        let dir = unique_temp_dir("perf_append");
        let path = dir.join("performance_log.json");
        fs::write(
            &path,
            r#"{"BTC/USDT": [{"direction": "SIDEWAYS", "timestamp": "t0"}]}"#,
        )
        .unwrap();

        let store = PerformanceLogStore::new(&path);
        store
            .append(&PerformanceRecord::new("BTC/USDT", Direction::Up, "t1".to_string()))
            .await
            .unwrap();
        store
            .append(&PerformanceRecord::new("BTC/USDT", Direction::Down, "t2".to_string()))
            .await
            .unwrap();

        let log = store.snapshot().await;
        let records = log.records("BTC/USDT");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].direction, Direction::Up);
        assert_eq!(records[1].timestamp, "t2");

        // The unreadable record is skipped in snapshots but never dropped from disk.
        let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["BTC/USDT"].as_array().unwrap().len(), 3);
        fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn test_corrupt_log_reads_empty() {
        let dir = unique_temp_dir("perf_corrupt");
        let path = dir.join("performance_log.json");
        fs::write(&path, "[1, 2").unwrap();

        let store = PerformanceLogStore::new(&path);
        assert!(store.snapshot().await.is_empty());
        fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn test_append_moves_corrupt_log_aside() {
        let dir = unique_temp_dir("perf_quarantine");
        let path = dir.join("performance_log.json");
        fs::write(&path, "{\"BTC/USDT\": [").unwrap();

        let store = PerformanceLogStore::new(&path);
        store
            .append(&PerformanceRecord::new("ETH/USDT", Direction::Down, "t1".to_string()))
            .await
            .unwrap();

        assert_eq!(store.snapshot().await.total_records(), 1);
        let aside: Vec<_> = fs::read_dir(&dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|p| p.to_string_lossy().contains("performance_log.json.corrupt-"))
            .collect();
        assert_eq!(aside.len(), 1);
        assert_eq!(fs::read_to_string(&aside[0]).unwrap(), "{\"BTC/USDT\": [");
        fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn test_append_fails_when_log_cannot_be_read() {
        let dir = unique_temp_dir("perf_io_error");
        let path = dir.join("performance_log.json");
        fs::create_dir(&path).unwrap();

        let store = PerformanceLogStore::new(&path);
        let result = store
            .append(&PerformanceRecord::new("BTC/USDT", Direction::Up, "t1".to_string()))
            .await;

        assert!(matches!(result, Err(StoreError::Io { .. })));
        assert!(path.is_dir());
        fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn test_concurrent_appends_lose_nothing() {
        let dir = unique_temp_dir("perf_concurrent");
        let store = Arc::new(PerformanceLogStore::new(dir.join("performance_log.json")));

        let mut handles = Vec::new();
        for i in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let feed = if i % 2 == 0 { "BTC/USDT" } else { "ETH/USDT" };
                store
                    .append(&PerformanceRecord::new(feed, Direction::Up, format!("t{}", i)))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let log = store.snapshot().await;
        assert_eq!(log.total_records(), 20);
        assert_eq!(log.records("ETH/USDT").len(), 10);
        fs::remove_dir_all(dir).ok();
    }
}

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "UP")]
    Up,
    #[serde(rename = "DOWN")]
    Down,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "UP",
            Direction::Down => "DOWN",
        }
    }
}

/// One submitted prediction, as stored in the performance log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    #[serde(rename = "feed", default)]
    pub feed_identifier: String,
    pub direction: Direction,
    #[serde(default)]
    pub timestamp: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Anything else a writer attached to the record.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PerformanceRecord {
    pub fn new(feed_identifier: impl Into<String>, direction: Direction, timestamp: String) -> Self {
        Self {
            feed_identifier: feed_identifier.into(),
            direction,
            timestamp,
            price: None,
            confidence: None,
            extra: Map::new(),
        }
    }
}

/// Read-only snapshot of the performance log: feed identifier to records in
/// append order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformanceLog {
    entries: BTreeMap<String, Vec<PerformanceRecord>>,
}

impl PerformanceLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from the raw stored document.
    ///
    /// Records that cannot be interpreted (unknown direction, not an object)
    /// are skipped and counted rather than failing the whole snapshot.
    pub fn from_raw(raw: &Map<String, Value>) -> (Self, usize) {
        let mut log = Self::new();
        let mut skipped = 0;

        for (feed, entries) in raw {
            let Some(entries) = entries.as_array() else {
                warn!("PerformanceLog: entries for {} are not a list, ignoring", feed);
                skipped += 1;
                continue;
            };

            let records = log.entries.entry(feed.clone()).or_default();
            for entry in entries {
                match serde_json::from_value::<PerformanceRecord>(entry.clone()) {
                    Ok(mut record) => {
                        if record.feed_identifier.is_empty() {
                            record.feed_identifier = feed.clone();
                        }
                        records.push(record);
                    }
                    Err(e) => {
                        warn!("PerformanceLog: skipping unreadable record for {}: {}", feed, e);
                        skipped += 1;
                    }
                }
            }
        }

        (log, skipped)
    }

    pub fn push(&mut self, record: PerformanceRecord) {
        self.entries
            .entry(record.feed_identifier.clone())
            .or_default()
            .push(record);
    }

    pub fn records(&self, feed: &str) -> &[PerformanceRecord] {
        self.entries.get(feed).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn feeds(&self) -> impl Iterator<Item = (&String, &Vec<PerformanceRecord>)> {
        self.entries.iter()
    }

    pub fn total_records(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_records() == 0
    }
}

//! Feed configuration model.
//!
//! The feed file is operator-authored, so the model is deliberately lossless:
//! every field the engine does not interpret is carried through verbatim,
//! the keys it does interpret are written back under the name they were read
//! from, and the document's outer shape survives a read-modify-write cycle.

use serde_json::{Map, Value};

pub const MIN_CONFIDENCE: f64 = 0.5;
pub const MAX_CONFIDENCE: f64 = 0.95;
pub const DEFAULT_CONFIDENCE: f64 = 0.6;

/// Key under which a wrapped document stores its feed list.
pub const FEEDS_KEY: &str = "feeds";

const CONFIDENCE_KEY: &str = "confidence";
/// Engine-owned watermark: sample count at the last adjustment.
pub const WATERMARK_KEY: &str = "adjusted_at_samples";

/// Round to the 3-decimal precision used for every persisted confidence.
pub fn round_confidence(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

pub fn clamp_confidence(value: f64) -> f64 {
    value.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}

/// Which key carried the feed identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKey {
    Identifier,
    Pair,
    Name,
}

impl IdentifierKey {
    const ALL: [IdentifierKey; 3] = [
        IdentifierKey::Identifier,
        IdentifierKey::Pair,
        IdentifierKey::Name,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IdentifierKey::Identifier => "identifier",
            IdentifierKey::Pair => "pair",
            IdentifierKey::Name => "name",
        }
    }
}

/// Which key (if any) carried the enabled flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnabledKey {
    Enabled,
    /// Legacy inverted flag: `skip: true` means disabled.
    Skip,
    Absent,
}

/// Read a boolean flag: JSON booleans, `"true"`/`"false"` in any case, and
/// numbers (non-zero is true). Anything else is unreadable.
fn parse_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::String(s) => {
            let s = s.trim();
            if s.eq_ignore_ascii_case("true") {
                Some(true)
            } else if s.eq_ignore_ascii_case("false") {
                Some(false)
            } else {
                None
            }
        }
        Value::Number(n) => n.as_f64().map(|n| n != 0.0),
        _ => None,
    }
}

/// Interpreted values as they were read, used to tell whether write-back
/// must replace the operator's raw value.
#[derive(Debug, Clone, PartialEq)]
struct Loaded {
    identifier: String,
    confidence: f64,
    enabled: bool,
    adjusted_at_samples: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feed {
    pub identifier: String,
    pub confidence: f64,
    pub enabled: bool,
    /// Sample count the engine last adjusted against.
    pub adjusted_at_samples: Option<usize>,
    /// Fields the engine does not interpret, preserved verbatim.
    pub metadata: Map<String, Value>,
    identifier_key: IdentifierKey,
    enabled_key: EnabledKey,
    raw: Map<String, Value>,
    loaded: Loaded,
}

impl Feed {
    pub fn identifier_key(&self) -> IdentifierKey {
        self.identifier_key
    }

    /// Build a feed from one record of the configuration file.
    ///
    /// Returns `None` when the record has no usable identifier. A flag that
    /// is present but unreadable disables the feed.
    pub fn from_record(record: &Map<String, Value>) -> Option<Self> {
        let (identifier_key, identifier) = IdentifierKey::ALL.iter().find_map(|key| {
            record
                .get(key.as_str())
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| (*key, s.to_string()))
        })?;

        let confidence = match record.get(CONFIDENCE_KEY) {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|c| c.is_finite())
        .unwrap_or(DEFAULT_CONFIDENCE);

        let (enabled_key, enabled) = if let Some(flag) = record.get("enabled") {
            (EnabledKey::Enabled, parse_flag(flag).unwrap_or(false))
        } else if let Some(flag) = record.get("skip") {
            (EnabledKey::Skip, parse_flag(flag).is_some_and(|skip| !skip))
        } else {
            (EnabledKey::Absent, true)
        };

        let adjusted_at_samples = record
            .get(WATERMARK_KEY)
            .and_then(Value::as_u64)
            .map(|n| n as usize);

        let interpreted = |key: &str| {
            key == identifier_key.as_str()
                || key == CONFIDENCE_KEY
                || key == WATERMARK_KEY
                || (key == "enabled" && enabled_key == EnabledKey::Enabled)
                || (key == "skip" && enabled_key == EnabledKey::Skip)
        };

        let metadata = record
            .iter()
            .filter(|(key, _)| !interpreted(key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Some(Self {
            loaded: Loaded {
                identifier: identifier.clone(),
                confidence,
                enabled,
                adjusted_at_samples,
            },
            identifier,
            confidence,
            enabled,
            adjusted_at_samples,
            metadata,
            identifier_key,
            enabled_key,
            raw: record.clone(),
        })
    }

    /// The value to write for an interpreted key. The raw value is kept
    /// unless the interpreted value changed since load.
    fn interpreted_value(&self, key: &str) -> Option<Value> {
        let raw = || self.raw.get(key).cloned();
        if key == self.identifier_key.as_str() {
            return if self.identifier == self.loaded.identifier {
                raw()
            } else {
                Some(Value::String(self.identifier.clone()))
            };
        }
        match key {
            CONFIDENCE_KEY if self.confidence == self.loaded.confidence => raw(),
            CONFIDENCE_KEY => Some(Value::from(self.confidence)),
            WATERMARK_KEY if self.adjusted_at_samples == self.loaded.adjusted_at_samples => raw(),
            WATERMARK_KEY => self.adjusted_at_samples.map(Value::from),
            "enabled" | "skip" if self.enabled == self.loaded.enabled => raw(),
            "enabled" if self.enabled_key == EnabledKey::Enabled => {
                Some(Value::Bool(self.enabled))
            }
            "skip" if self.enabled_key == EnabledKey::Skip => Some(Value::Bool(!self.enabled)),
            _ => None,
        }
    }

    /// Serialize back to a record, keeping the original key order.
    ///
    /// Keys that did not exist before are appended at the end.
    pub fn to_record(&self) -> Map<String, Value> {
        let mut out = Map::new();

        for key in self.raw.keys() {
            if let Some(value) = self.interpreted_value(key) {
                out.insert(key.clone(), value);
            } else if let Some(value) = self.metadata.get(key) {
                out.insert(key.clone(), value.clone());
            }
        }

        for (key, value) in &self.metadata {
            if !out.contains_key(key) {
                out.insert(key.clone(), value.clone());
            }
        }

        let id_key = self.identifier_key.as_str();
        if !out.contains_key(id_key) {
            out.insert(id_key.to_string(), Value::String(self.identifier.clone()));
        }
        if !out.contains_key(CONFIDENCE_KEY) {
            out.insert(CONFIDENCE_KEY.to_string(), Value::from(self.confidence));
        }
        if let Some(samples) = self.adjusted_at_samples {
            out.entry(WATERMARK_KEY.to_string())
                .or_insert_with(|| Value::from(samples));
        }
        if self.enabled_key == EnabledKey::Absent && !self.enabled {
            out.insert("enabled".to_string(), Value::Bool(false));
        }

        out
    }
}

/// One entry of the feed list.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedRecord {
    Known(Feed),
    /// No identifiable key (or not an object); passed through unmodified.
    Unrecognized(Value),
}

impl FeedRecord {
    pub fn from_value(value: Value) -> Self {
        let feed = match &value {
            Value::Object(map) => Feed::from_record(map),
            _ => None,
        };
        match feed {
            Some(feed) => FeedRecord::Known(feed),
            None => FeedRecord::Unrecognized(value),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            FeedRecord::Known(feed) => Value::Object(feed.to_record()),
            FeedRecord::Unrecognized(value) => value.clone(),
        }
    }

    pub fn as_feed(&self) -> Option<&Feed> {
        match self {
            FeedRecord::Known(feed) => Some(feed),
            FeedRecord::Unrecognized(_) => None,
        }
    }
}

/// Outer shape of the feed document, decided once at load time.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedShape {
    /// The document is the feed list itself.
    Bare,
    /// The document is an object holding the list under `key`; the other
    /// top-level fields are kept in `document`.
    Wrapped {
        key: String,
        document: Map<String, Value>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedDocument {
    pub shape: FeedShape,
    pub feeds: Vec<FeedRecord>,
}

impl FeedDocument {
    pub fn empty() -> Self {
        Self {
            shape: FeedShape::Bare,
            feeds: Vec::new(),
        }
    }

    /// Parse a document of either shape. Returns the reason on failure.
    pub fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Array(items) => Ok(Self {
                shape: FeedShape::Bare,
                feeds: items.into_iter().map(FeedRecord::from_value).collect(),
            }),
            Value::Object(mut document) => {
                // The slot stays in place (as null) so write-back keeps its position.
                let items = match document.get_mut(FEEDS_KEY).map(Value::take) {
                    Some(Value::Array(items)) => items,
                    Some(Value::Null) => Vec::new(),
                    Some(_) => return Err(format!("'{}' is not a list", FEEDS_KEY)),
                    None => return Err(format!("object without a '{}' list", FEEDS_KEY)),
                };
                Ok(Self {
                    shape: FeedShape::Wrapped {
                        key: FEEDS_KEY.to_string(),
                        document,
                    },
                    feeds: items.into_iter().map(FeedRecord::from_value).collect(),
                })
            }
            _ => Err("expected a list or an object".to_string()),
        }
    }

    pub fn to_value(&self) -> Value {
        let list = Value::Array(self.feeds.iter().map(FeedRecord::to_value).collect());
        match &self.shape {
            FeedShape::Bare => list,
            FeedShape::Wrapped { key, document } => {
                let mut document = document.clone();
                document.insert(key.clone(), list);
                Value::Object(document)
            }
        }
    }

    pub fn known_feeds(&self) -> impl Iterator<Item = &Feed> {
        self.feeds.iter().filter_map(FeedRecord::as_feed)
    }

    pub fn enabled_feeds(&self) -> impl Iterator<Item = &Feed> {
        self.known_feeds().filter(|feed| feed.enabled)
    }
}

/// `BTC/USDT` -> `BTCUSDT`
pub fn exchange_symbol(identifier: &str) -> String {
    identifier.replace('/', "")
}

/// `BTC/USDT` -> `Predictoor_BTC_USDT`
pub fn job_name(identifier: &str) -> String {
    format!("Predictoor_{}", identifier.replace('/', "_"))
}

/// Inverse of [`job_name`]; `None` for jobs this agent did not create.
pub fn feed_from_job_name(name: &str) -> Option<String> {
    name.strip_prefix("Predictoor_")
        .filter(|rest| !rest.is_empty())
        .map(|rest| rest.replace('_', "/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test record must be an object"),
        }
    }

    #[test]
    fn test_identifier_key_precedence() {
        let feed = Feed::from_record(&record(json!({"name": "n", "pair": "ETH/USDT"}))).unwrap();
        assert_eq!(feed.identifier, "ETH/USDT");
        assert_eq!(feed.identifier_key(), IdentifierKey::Pair);

        assert!(Feed::from_record(&record(json!({"pair": "  ", "confidence": 0.7}))).is_none());
    }

    #[test]
    fn test_defaults_when_fields_missing() {
        let feed = Feed::from_record(&record(json!({"identifier": "SOL/USDT"}))).unwrap();
        assert_eq!(feed.confidence, DEFAULT_CONFIDENCE);
        assert!(feed.enabled);
        assert!(feed.adjusted_at_samples.is_none());
    }

    #[test]
    fn test_skip_flag_written_back_inverted() {
        let mut feed =
            Feed::from_record(&record(json!({"pair": "BTC/USDT", "skip": false}))).unwrap();
        assert!(feed.enabled);
        feed.enabled = false;

        let out = feed.to_record();
        assert_eq!(out.get("skip"), Some(&json!(true)));
        assert!(!out.contains_key("enabled"));
    }

    #[test]
    fn test_string_flags_are_honoured() {
        let doc = FeedDocument::from_value(json!([
            {"pair": "BTC/USDT", "enabled": "false"},
            {"pair": "ETH/USDT", "skip": "TRUE"},
            {"pair": "SOL/USDT", "enabled": "True"},
            {"pair": "ADA/USDT", "skip": "false"}
        ]))
        .unwrap();

        let enabled: Vec<&str> = doc.enabled_feeds().map(|f| f.identifier.as_str()).collect();
        assert_eq!(enabled, vec!["SOL/USDT", "ADA/USDT"]);

        // Untouched flags are written back exactly as the operator wrote them.
        assert_eq!(
            doc.to_value(),
            json!([
                {"pair": "BTC/USDT", "enabled": "false", "confidence": 0.6},
                {"pair": "ETH/USDT", "skip": "TRUE", "confidence": 0.6},
                {"pair": "SOL/USDT", "enabled": "True", "confidence": 0.6},
                {"pair": "ADA/USDT", "skip": "false", "confidence": 0.6}
            ])
        );
    }

    #[test]
    fn test_unreadable_flags_disable_the_feed() {
        for flag in [json!("yes"), json!(null), json!([true])] {
            let enabled = Feed::from_record(&record(json!({"pair": "A/B", "enabled": flag.clone()})))
                .unwrap();
            assert!(!enabled.enabled, "enabled: {}", flag);

            let skip = Feed::from_record(&record(json!({"pair": "A/B", "skip": flag.clone()}))).unwrap();
            assert!(!skip.enabled, "skip: {}", flag);
            assert_eq!(skip.to_record().get("skip"), Some(&flag));
        }

        let numeric = Feed::from_record(&record(json!({"pair": "A/B", "skip": 1}))).unwrap();
        assert!(!numeric.enabled);
        let numeric = Feed::from_record(&record(json!({"pair": "A/B", "enabled": 1}))).unwrap();
        assert!(numeric.enabled);
    }

    #[test]
    fn test_disabling_string_flag_writes_boolean() {
        let mut feed =
            Feed::from_record(&record(json!({"pair": "BTC/USDT", "enabled": "true"}))).unwrap();
        feed.enabled = false;
        assert_eq!(feed.to_record().get("enabled"), Some(&json!(false)));
    }

    #[test]
    fn test_raw_values_kept_unless_changed() {
        let original = record(json!({"pair": " BTC/USDT ", "confidence": "high"}));
        let mut feed = Feed::from_record(&original).unwrap();
        assert_eq!(feed.identifier, "BTC/USDT");
        assert_eq!(feed.confidence, DEFAULT_CONFIDENCE);
        assert_eq!(feed.to_record(), original);

        feed.confidence = 0.63;
        let out = feed.to_record();
        assert_eq!(out.get("pair"), Some(&json!(" BTC/USDT ")));
        assert_eq!(out.get("confidence"), Some(&json!(0.63)));
    }

    #[test]
    fn test_disable_without_flag_adds_enabled_false() {
        let mut feed = Feed::from_record(&record(json!({"pair": "BTC/USDT"}))).unwrap();
        feed.enabled = false;
        assert_eq!(feed.to_record().get("enabled"), Some(&json!(false)));
    }

    #[test]
    fn test_record_roundtrip_keeps_order_and_extras() {
        let original = record(json!({
            "source": "binance",
            "pair": "BTC/USDT",
            "timeframe": "5m",
            "confidence": 0.7,
            "notes": {"owner": "ops"}
        }));
        let feed = Feed::from_record(&original).unwrap();
        assert_eq!(feed.metadata.len(), 3);

        let out = feed.to_record();
        let keys: Vec<&String> = out.keys().collect();
        assert_eq!(keys, vec!["source", "pair", "timeframe", "confidence", "notes"]);
        assert_eq!(Value::Object(out), Value::Object(original));
    }

    #[test]
    fn test_document_shapes() {
        let bare = FeedDocument::from_value(json!([{"pair": "A/B"}])).unwrap();
        assert_eq!(bare.shape, FeedShape::Bare);
        assert!(bare.to_value().is_array());

        let wrapped =
            FeedDocument::from_value(json!({"version": 2, "feeds": [{"pair": "A/B"}]})).unwrap();
        assert!(matches!(wrapped.shape, FeedShape::Wrapped { .. }));
        let out = wrapped.to_value();
        assert_eq!(out["version"], json!(2));
        assert_eq!(out["feeds"][0]["pair"], json!("A/B"));

        assert!(FeedDocument::from_value(json!({"other": []})).is_err());
        assert!(FeedDocument::from_value(json!("text")).is_err());
    }

    #[test]
    fn test_unrecognized_records_pass_through() {
        let doc = FeedDocument::from_value(json!([{"comment": "todo"}, 42, {"pair": "X/Y"}]))
            .unwrap();
        assert_eq!(doc.known_feeds().count(), 1);
        assert_eq!(doc.to_value(), json!([{"comment": "todo"}, 42, {"pair": "X/Y", "confidence": 0.6}]));
    }

    #[test]
    fn test_job_name_mapping() {
        assert_eq!(job_name("BTC/USDT"), "Predictoor_BTC_USDT");
        assert_eq!(feed_from_job_name("Predictoor_ETH_USDT").as_deref(), Some("ETH/USDT"));
        assert!(feed_from_job_name("other_job").is_none());
        assert_eq!(exchange_symbol("SOL/USDT"), "SOLUSDT");
    }

    #[test]
    fn test_round_confidence() {
        assert_eq!(round_confidence(0.70 + 0.03), 0.73);
        assert_eq!(round_confidence(0.70 - 0.03), 0.67);
        assert_eq!(clamp_confidence(0.99), MAX_CONFIDENCE);
        assert_eq!(clamp_confidence(0.2), MIN_CONFIDENCE);
    }
}

//! Discovery domain types.
//!
//! A discovered value is a live external fact (the active prediction
//! contract, the relayer to hand transactions to) together with where it
//! came from. Extraction of the value from the two known registry payload
//! shapes lives here as pure functions so it can be tested without I/O.

use serde_json::Value;
use std::fmt;

/// Where a discovered value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Remote,
    Cache,
    Fallback,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Remote => write!(f, "REMOTE"),
            Provenance::Cache => write!(f, "CACHE"),
            Provenance::Fallback => write!(f, "FALLBACK"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredValue {
    pub value: String,
    pub source: Provenance,
    /// True only for remote values that passed acceptance checks.
    pub verified: bool,
}

impl DiscoveredValue {
    pub fn remote(value: String) -> Self {
        Self {
            value,
            source: Provenance::Remote,
            verified: true,
        }
    }

    pub fn cached(value: String) -> Self {
        Self {
            value,
            source: Provenance::Cache,
            verified: false,
        }
    }

    pub fn fallback(value: String) -> Self {
        Self {
            value,
            source: Provenance::Fallback,
            verified: false,
        }
    }
}

/// How to pull the target field out of a source's JSON payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// `{"<network>": {"<contract_key>": "<addr>"}}`, probing each network
    /// name in order.
    ContractRegistry {
        networks: Vec<String>,
        contract_key: String,
    },
    /// `{"relayers": [...]}` or a bare `[...]` of `{address, jobsExecuted}`.
    BestRelayer,
}

impl Extraction {
    /// Human-readable name of the field being extracted, for error reports.
    pub fn field_name(&self) -> String {
        match self {
            Extraction::ContractRegistry { contract_key, .. } => contract_key.clone(),
            Extraction::BestRelayer => "relayers[].address".to_string(),
        }
    }

    pub fn extract(&self, payload: &Value) -> Option<String> {
        match self {
            Extraction::ContractRegistry {
                networks,
                contract_key,
            } => extract_registry_contract(payload, networks, contract_key),
            Extraction::BestRelayer => select_best_relayer(payload),
        }
    }
}

fn non_empty_str(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// First non-empty `contract_key` found under the given network sections.
pub fn extract_registry_contract(
    payload: &Value,
    networks: &[String],
    contract_key: &str,
) -> Option<String> {
    let sections = payload.as_object()?;
    networks.iter().find_map(|network| {
        sections
            .get(network)
            .and_then(|section| section.get(contract_key))
            .and_then(non_empty_str)
    })
}

/// `jobsExecuted` may arrive as an integer, a float, or a numeric string.
/// Anything else, including NaN and infinities, counts as zero.
fn jobs_executed(candidate: &Value) -> f64 {
    match candidate.get("jobsExecuted") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|jobs| jobs.is_finite())
    .unwrap_or(0.0)
}

/// Pick the relayer with the highest `jobsExecuted`.
///
/// Ties go to the earliest candidate in the list. Candidates without an
/// address are ignored.
pub fn select_best_relayer(payload: &Value) -> Option<String> {
    let candidates = match payload {
        Value::Array(items) => items,
        Value::Object(map) => map.get("relayers")?.as_array()?,
        _ => return None,
    };

    let mut best: Option<(f64, String)> = None;
    for candidate in candidates {
        let Some(address) = candidate.get("address").and_then(non_empty_str) else {
            continue;
        };
        let jobs = jobs_executed(candidate);
        match &best {
            Some((best_jobs, _)) if jobs <= *best_jobs => {}
            _ => best = Some((jobs, address)),
        }
    }

    best.map(|(_, address)| address)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn networks() -> Vec<String> {
        vec!["sapphire-mainnet".to_string(), "mainnet".to_string()]
    }

    #[test]
    fn test_relayer_tie_break_prefers_first_max() {
        let payload = json!([
            {"address": "A", "jobsExecuted": 5},
            {"address": "B", "jobsExecuted": 9},
            {"address": "C", "jobsExecuted": 9}
        ]);
        assert_eq!(select_best_relayer(&payload).as_deref(), Some("B"));
    }

    #[test]
    fn test_relayer_wrapped_shape() {
        let payload = json!({"relayers": [
            {"address": "0xaaa", "jobsExecuted": "12"},
            {"address": "0xbbb", "jobsExecuted": 3}
        ]});
        assert_eq!(select_best_relayer(&payload).as_deref(), Some("0xaaa"));
    }

    #[test]
    fn test_relayer_missing_counter_counts_as_zero() {
        let payload = json!([{"address": "first"}, {"address": "second"}]);
        assert_eq!(select_best_relayer(&payload).as_deref(), Some("first"));
    }

    #[test]
    fn test_relayer_non_finite_counters_count_as_zero() {
        let payload = json!([
            {"address": "A", "jobsExecuted": 4},
            {"address": "B", "jobsExecuted": "NaN"},
            {"address": "C", "jobsExecuted": "inf"},
            {"address": "D", "jobsExecuted": "-infinity"}
        ]);
        assert_eq!(select_best_relayer(&payload).as_deref(), Some("A"));

        let all_bad = json!([{"address": "X", "jobsExecuted": "nan"}, {"address": "Y"}]);
        assert_eq!(select_best_relayer(&all_bad).as_deref(), Some("X"));
    }

    #[test]
    fn test_relayer_without_addresses_yields_none() {
        assert!(select_best_relayer(&json!([{"jobsExecuted": 4}])).is_none());
        assert!(select_best_relayer(&json!({"relayers": []})).is_none());
        assert!(select_best_relayer(&json!({"other": 1})).is_none());
        assert!(select_best_relayer(&json!("nope")).is_none());
    }

    #[test]
    fn test_registry_tries_networks_in_order() {
        let payload = json!({
            "mainnet": {"Predictoor": "0xMAIN"},
            "sapphire-mainnet": {"Predictoor": "0xSAPPHIRE"}
        });
        assert_eq!(
            extract_registry_contract(&payload, &networks(), "Predictoor").as_deref(),
            Some("0xSAPPHIRE")
        );

        let only_mainnet = json!({"mainnet": {"Predictoor": "0xMAIN"}});
        assert_eq!(
            extract_registry_contract(&only_mainnet, &networks(), "Predictoor").as_deref(),
            Some("0xMAIN")
        );
    }

    #[test]
    fn test_registry_missing_or_empty_field() {
        let empty = json!({"sapphire-mainnet": {"Predictoor": ""}});
        assert!(extract_registry_contract(&empty, &networks(), "Predictoor").is_none());

        let list = json!([{"Predictoor": "0x1"}]);
        assert!(extract_registry_contract(&list, &networks(), "Predictoor").is_none());
    }
}

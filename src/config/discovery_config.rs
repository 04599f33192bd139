//! Discovery configuration parsing from environment variables.
//!
//! Registry and relayer list sources, compiled-in fallbacks, cache-independent
//! retry policy and the optional on-chain verification endpoint.

use super::{optional_string, parse_list, parse_string, parse_u32, parse_u64, validate_url};
use anyhow::{Result, bail};
use std::time::Duration;

/// Compiled-in contract used when every source and the cache are unavailable.
/// Placeholder address; deployments set `FALLBACK_PREDICTOOR_CONTRACT`.
pub const DEFAULT_FALLBACK_CONTRACT: &str = "0x4a2e3b7c1d9f8e6a5b4c3d2e1f0a9b8c7d6e5f41";
/// Compiled-in relayer used when every source and the cache are unavailable.
/// Placeholder address; deployments set `FALLBACK_RELAYER`. Job verification
/// is skipped while this fallback is in use.
pub const DEFAULT_FALLBACK_RELAYER: &str = "0x3c5f8d2a1b7e9c4d6f0a2b8e1c3d5f7a9b0c2e4d";

const DEFAULT_CONTRACT_SOURCES: &[&str] = &[
    "https://oceanprotocol.github.io/contracts/addresses.mainnet.json",
    "https://raw.githubusercontent.com/oceanprotocol/contracts/main/addresses/address.json",
];
const DEFAULT_RELAYER_SOURCES: &[&str] = &["https://relay.gelato.digital/api/v2/relayers"];
const DEFAULT_NETWORKS: &[&str] = &["sapphire-mainnet", "mainnet"];

#[derive(Debug, Clone)]
pub struct DiscoveryEnvConfig {
    pub contract_sources: Vec<String>,
    pub networks: Vec<String>,
    pub contract_key: String,
    pub fallback_contract: String,
    pub relayer_sources: Vec<String>,
    pub fallback_relayer: String,
    pub verify_rpc_url: Option<String>,
    pub retries: u32,
    pub retry_delay: Duration,
    pub http_timeout: Duration,
}

impl Default for DiscoveryEnvConfig {
    fn default() -> Self {
        Self {
            contract_sources: DEFAULT_CONTRACT_SOURCES.iter().map(|s| s.to_string()).collect(),
            networks: DEFAULT_NETWORKS.iter().map(|s| s.to_string()).collect(),
            contract_key: "Predictoor".to_string(),
            fallback_contract: DEFAULT_FALLBACK_CONTRACT.to_string(),
            relayer_sources: DEFAULT_RELAYER_SOURCES.iter().map(|s| s.to_string()).collect(),
            fallback_relayer: DEFAULT_FALLBACK_RELAYER.to_string(),
            verify_rpc_url: None,
            retries: 3,
            retry_delay: Duration::from_secs(3),
            http_timeout: Duration::from_secs(10),
        }
    }
}

impl DiscoveryEnvConfig {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            contract_sources: parse_list("PREDICTOOR_CONTRACT_SOURCES", DEFAULT_CONTRACT_SOURCES),
            networks: parse_list("PREDICTOOR_NETWORKS", DEFAULT_NETWORKS),
            contract_key: parse_string("PREDICTOOR_CONTRACT_KEY", "Predictoor"),
            fallback_contract: parse_string(
                "FALLBACK_PREDICTOOR_CONTRACT",
                DEFAULT_FALLBACK_CONTRACT,
            ),
            relayer_sources: parse_list("RELAYER_SOURCES", DEFAULT_RELAYER_SOURCES),
            fallback_relayer: parse_string("FALLBACK_RELAYER", DEFAULT_FALLBACK_RELAYER),
            verify_rpc_url: optional_string("VERIFY_RPC_URL"),
            retries: parse_u32("DISCOVERY_RETRIES", 3)?,
            retry_delay: Duration::from_secs(parse_u64("DISCOVERY_RETRY_DELAY_SECS", 3)?),
            http_timeout: Duration::from_secs(parse_u64("HTTP_TIMEOUT_SECS", 10)?),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for url in &self.contract_sources {
            validate_url("PREDICTOOR_CONTRACT_SOURCES", url)?;
        }
        for url in &self.relayer_sources {
            validate_url("RELAYER_SOURCES", url)?;
        }
        if let Some(rpc) = &self.verify_rpc_url {
            validate_url("VERIFY_RPC_URL", rpc)?;
        }
        if self.networks.is_empty() {
            bail!("PREDICTOOR_NETWORKS must name at least one network");
        }
        if self.retries == 0 {
            bail!("DISCOVERY_RETRIES must be at least 1");
        }
        Ok(())
    }
}

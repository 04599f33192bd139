//! Configuration module for the Predictoor agent.
//!
//! This module provides structured configuration loading from environment variables,
//! organized by concern: Discovery, Accuracy, Agent endpoints, Notifications,
//! Storage and Supervision. The resulting [`Config`] is built once at startup
//! and handed to the components that need it.

mod accuracy_config;
mod agent_config;
mod discovery_config;
mod notifier_config;
mod storage_config;
mod supervisor_config;

pub use accuracy_config::AccuracyEnvConfig;
pub use agent_config::{AgentEnvConfig, ClaimTarget};
pub use discovery_config::{
    DEFAULT_FALLBACK_CONTRACT, DEFAULT_FALLBACK_RELAYER, DiscoveryEnvConfig,
};
pub use notifier_config::NotifierEnvConfig;
pub use storage_config::StorageEnvConfig;
pub use supervisor_config::SupervisorEnvConfig;

use anyhow::{Context, Result, bail};
use std::env;

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub discovery: DiscoveryEnvConfig,
    pub accuracy: AccuracyEnvConfig,
    pub agent: AgentEnvConfig,
    pub notifier: NotifierEnvConfig,
    pub storage: StorageEnvConfig,
    pub supervisor: SupervisorEnvConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This orchestrates loading from all sub-config modules and composes
    /// them into a unified Config struct.
    pub fn from_env() -> Result<Self> {
        let discovery =
            DiscoveryEnvConfig::from_env().context("Failed to load discovery config")?;
        let accuracy = AccuracyEnvConfig::from_env().context("Failed to load accuracy config")?;
        let agent = AgentEnvConfig::from_env().context("Failed to load agent config")?;
        let notifier = NotifierEnvConfig::from_env();
        let storage = StorageEnvConfig::from_env();
        let supervisor =
            SupervisorEnvConfig::from_env().context("Failed to load supervisor config")?;

        Ok(Self {
            discovery,
            accuracy,
            agent,
            notifier,
            storage,
            supervisor,
        })
    }

    /// The wallet address, for commands that cannot run without one.
    pub fn require_wallet(&self) -> Result<&str> {
        match self.agent.wallet_address.as_deref() {
            Some(wallet) if !wallet.trim().is_empty() => Ok(wallet),
            _ => bail!("WALLET_ADDRESS is not set"),
        }
    }
}

fn parse_usize(key: &str, default: usize) -> Result<usize> {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .trim()
        .parse::<usize>()
        .context(format!("Failed to parse {}", key))
}

fn parse_u32(key: &str, default: u32) -> Result<u32> {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .trim()
        .parse::<u32>()
        .context(format!("Failed to parse {}", key))
}

fn parse_u64(key: &str, default: u64) -> Result<u64> {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .trim()
        .parse::<u64>()
        .context(format!("Failed to parse {}", key))
}

fn parse_f64(key: &str, default: f64) -> Result<f64> {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .trim()
        .parse::<f64>()
        .context(format!("Failed to parse {}", key))
}

fn parse_string(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn optional_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Comma-separated list; blank entries are dropped.
fn parse_list(key: &str, default: &[&str]) -> Vec<String> {
    match optional_string(key) {
        Some(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        None => default.iter().map(|s| s.to_string()).collect(),
    }
}

fn validate_url(key: &str, value: &str) -> Result<()> {
    url::Url::parse(value).with_context(|| format!("{} contains an invalid URL: {}", key, value))?;
    Ok(())
}

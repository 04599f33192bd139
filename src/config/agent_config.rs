//! Agent endpoint and cadence configuration parsing from environment variables.
//!
//! Wallet identity, credentials, the HTTP endpoints the agent talks to and the
//! intervals of each scheduled job.

use super::{optional_string, parse_string, parse_u64, validate_url};
use anyhow::{Context, Result, bail};
use std::time::Duration;

const DEFAULT_CLAIM_URLS: &str =
    "OCEAN=https://api.predictoor.ai/v1/claim/ocean,ROSE=https://api.predictoor.ai/v1/claim/rose";

/// One token claim endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimTarget {
    pub token: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct AgentEnvConfig {
    pub wallet_address: Option<String>,
    pub predictoor_api_key: Option<String>,
    pub gelato_api_key: Option<String>,

    pub price_api_url: String,
    pub relay_submit_url: String,
    pub claim_targets: Vec<ClaimTarget>,
    pub explorer_api_url: String,
    pub gelato_jobs_url: String,

    pub prediction_interval: Duration,
    pub submission_pacing: Duration,
    pub claim_pacing: Duration,
    pub accuracy_interval: Duration,
    pub claim_interval: Duration,
    pub profit_interval: Duration,
    pub jobs_check_interval: Duration,
    pub job_trigger_interval_secs: u64,
}

impl Default for AgentEnvConfig {
    fn default() -> Self {
        Self {
            wallet_address: None,
            predictoor_api_key: None,
            gelato_api_key: None,
            price_api_url: "https://api.binance.com".to_string(),
            relay_submit_url: "https://relay.gelato.digital/meta-tx".to_string(),
            claim_targets: parse_claim_targets(DEFAULT_CLAIM_URLS).unwrap_or_default(),
            explorer_api_url: "https://api.sapphire.oasis.io/api/v1/accounts".to_string(),
            gelato_jobs_url: "https://api.gelato.network/v2/jobs".to_string(),
            prediction_interval: Duration::from_secs(30 * 60),
            submission_pacing: Duration::from_secs(3),
            claim_pacing: Duration::from_secs(2),
            accuracy_interval: Duration::from_secs(360 * 60),
            claim_interval: Duration::from_secs(1440 * 60),
            profit_interval: Duration::from_secs(1440 * 60),
            jobs_check_interval: Duration::from_secs(360 * 60),
            job_trigger_interval_secs: 1800,
        }
    }
}

impl AgentEnvConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let minutes = |key: &str, default: Duration| -> Result<Duration> {
            minutes_to_duration(key, parse_u64(key, default.as_secs() / 60)?)
        };
        let seconds = |key: &str, default: Duration| -> Result<Duration> {
            Ok(Duration::from_secs(parse_u64(key, default.as_secs())?))
        };

        let claim_targets = match optional_string("CLAIM_URLS") {
            Some(raw) => parse_claim_targets(&raw)?,
            None => defaults.claim_targets.clone(),
        };

        let config = Self {
            wallet_address: optional_string("WALLET_ADDRESS"),
            predictoor_api_key: optional_string("PREDICTOOR_API_KEY"),
            gelato_api_key: optional_string("GELATO_API_KEY"),
            price_api_url: parse_string("PRICE_API_URL", &defaults.price_api_url),
            relay_submit_url: parse_string("RELAY_SUBMIT_URL", &defaults.relay_submit_url),
            claim_targets,
            explorer_api_url: parse_string("EXPLORER_API_URL", &defaults.explorer_api_url),
            gelato_jobs_url: parse_string("GELATO_JOBS_URL", &defaults.gelato_jobs_url),
            prediction_interval: minutes("PREDICTION_INTERVAL_MINUTES", defaults.prediction_interval)?,
            submission_pacing: seconds("SUBMISSION_PACING_SECS", defaults.submission_pacing)?,
            claim_pacing: seconds("CLAIM_PACING_SECS", defaults.claim_pacing)?,
            accuracy_interval: minutes("ACCURACY_INTERVAL_MINUTES", defaults.accuracy_interval)?,
            claim_interval: minutes("CLAIM_INTERVAL_MINUTES", defaults.claim_interval)?,
            profit_interval: minutes("PROFIT_INTERVAL_MINUTES", defaults.profit_interval)?,
            jobs_check_interval: minutes("GELATO_JOB_CHECK_INTERVAL_MINUTES", defaults.jobs_check_interval)?,
            job_trigger_interval_secs: parse_u64(
                "GELATO_JOB_INTERVAL_SECS",
                defaults.job_trigger_interval_secs,
            )?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_url("PRICE_API_URL", &self.price_api_url)?;
        validate_url("RELAY_SUBMIT_URL", &self.relay_submit_url)?;
        validate_url("EXPLORER_API_URL", &self.explorer_api_url)?;
        validate_url("GELATO_JOBS_URL", &self.gelato_jobs_url)?;
        for target in &self.claim_targets {
            validate_url("CLAIM_URLS", &target.url)?;
        }
        if self.prediction_interval.is_zero() {
            bail!("PREDICTION_INTERVAL_MINUTES must be at least 1");
        }
        Ok(())
    }
}

fn minutes_to_duration(key: &str, minutes: u64) -> Result<Duration> {
    minutes
        .checked_mul(60)
        .map(Duration::from_secs)
        .with_context(|| format!("{} is too large: {} minutes", key, minutes))
}

/// Parse `TOKEN=url,TOKEN=url`.
pub fn parse_claim_targets(raw: &str) -> Result<Vec<ClaimTarget>> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (token, url) = entry
                .split_once('=')
                .with_context(|| format!("CLAIM_URLS entry '{}' is not TOKEN=url", entry))?;
            let (token, url) = (token.trim(), url.trim());
            if token.is_empty() || url.is_empty() {
                bail!("CLAIM_URLS entry '{}' is not TOKEN=url", entry);
            }
            Ok(ClaimTarget {
                token: token.to_uppercase(),
                url: url.to_string(),
            })
        })
        .collect()
}

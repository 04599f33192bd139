//! Supervised runner configuration parsing from environment variables.

use super::{parse_u64, parse_usize};
use anyhow::{Result, bail};
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct SupervisorEnvConfig {
    /// Consecutive failed cycles before the breaker opens.
    pub max_consecutive_failures: usize,
    /// Pause after a single failed cycle.
    pub error_cooldown: Duration,
    /// Pause while the breaker is open.
    pub trip_cooldown: Duration,
}

impl Default for SupervisorEnvConfig {
    fn default() -> Self {
        Self {
            max_consecutive_failures: 5,
            error_cooldown: Duration::from_secs(10),
            trip_cooldown: Duration::from_secs(300),
        }
    }
}

impl SupervisorEnvConfig {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            max_consecutive_failures: parse_usize("SUPERVISOR_MAX_CONSECUTIVE_FAILURES", 5)?,
            error_cooldown: Duration::from_secs(parse_u64("SUPERVISOR_ERROR_COOLDOWN_SECS", 10)?),
            trip_cooldown: Duration::from_secs(parse_u64("SUPERVISOR_TRIP_COOLDOWN_SECS", 300)?),
        };
        if config.max_consecutive_failures == 0 {
            bail!("SUPERVISOR_MAX_CONSECUTIVE_FAILURES must be at least 1");
        }
        Ok(config)
    }
}

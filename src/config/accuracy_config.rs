//! Accuracy engine configuration parsing from environment variables.

use super::{parse_f64, parse_usize};
use crate::domain::performance::AccuracyPolicy;
use anyhow::{Result, bail};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AccuracyEnvConfig {
    pub policy: AccuracyPolicy,
}

impl AccuracyEnvConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = AccuracyPolicy::default();
        let policy = AccuracyPolicy {
            minimum_sample_size: parse_usize("ACCURACY_MIN_SAMPLES", defaults.minimum_sample_size)?,
            skip_threshold: parse_f64("ACCURACY_SKIP_THRESHOLD", defaults.skip_threshold)?,
            raise_threshold: parse_f64("ACCURACY_RAISE_THRESHOLD", defaults.raise_threshold)?,
            lower_threshold: parse_f64("ACCURACY_LOWER_THRESHOLD", defaults.lower_threshold)?,
            step: parse_f64("CONFIDENCE_STEP", defaults.step)?,
        };
        Self::validate(&policy)?;
        Ok(Self { policy })
    }

    pub fn validate(policy: &AccuracyPolicy) -> Result<()> {
        for (name, value) in [
            ("ACCURACY_SKIP_THRESHOLD", policy.skip_threshold),
            ("ACCURACY_RAISE_THRESHOLD", policy.raise_threshold),
            ("ACCURACY_LOWER_THRESHOLD", policy.lower_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                bail!("{} must be between 0 and 1, got {}", name, value);
            }
        }
        if policy.lower_threshold > policy.raise_threshold {
            bail!(
                "ACCURACY_LOWER_THRESHOLD ({}) must not exceed ACCURACY_RAISE_THRESHOLD ({})",
                policy.lower_threshold,
                policy.raise_threshold
            );
        }
        if !(policy.step > 0.0 && policy.step <= 0.45) {
            bail!("CONFIDENCE_STEP must be in (0, 0.45], got {}", policy.step);
        }
        if policy.minimum_sample_size == 0 {
            bail!("ACCURACY_MIN_SAMPLES must be at least 1");
        }
        Ok(())
    }
}

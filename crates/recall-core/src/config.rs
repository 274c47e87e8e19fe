//! Core configuration read from the environment.
//!
//! Reads:
//! - RECALL_SWEEP_AT (optional, `HH:MM` UTC, default: "02:00")
//! - RECALL_SWEEP_CONCURRENCY (optional, default: 1)
//! - RECALL_LOG_FORMAT (optional, "json" enables JSON logs)
//!
//! Store settings (`SURREALDB_*`) are read by `recall_state` directly.

use crate::domain::{RecallError, Result};
use crate::schedule::SweepTime;

pub const ENV_SWEEP_AT: &str = "RECALL_SWEEP_AT";
pub const ENV_SWEEP_CONCURRENCY: &str = "RECALL_SWEEP_CONCURRENCY";
pub const ENV_LOG_FORMAT: &str = "RECALL_LOG_FORMAT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecallConfig {
    pub sweep_at: SweepTime,
    pub sweep_concurrency: usize,
    pub json_logs: bool,
}

impl Default for RecallConfig {
    fn default() -> Self {
        Self {
            sweep_at: SweepTime::default(),
            sweep_concurrency: 1,
            json_logs: false,
        }
    }
}

impl RecallConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (a `.env` file, a map, the process env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_SWEEP_AT) {
            config.sweep_at = raw.parse()?;
        }
        if let Some(raw) = lookup(ENV_SWEEP_CONCURRENCY) {
            config.sweep_concurrency = raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    RecallError::invalid(format!(
                        "{ENV_SWEEP_CONCURRENCY} must be a positive integer, got '{raw}'"
                    ))
                })?;
        }
        if let Some(raw) = lookup(ENV_LOG_FORMAT) {
            config.json_logs = raw.trim().eq_ignore_ascii_case("json");
        }

        Ok(config)
    }
}

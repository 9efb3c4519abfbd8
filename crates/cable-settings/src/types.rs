//! Settings type definitions.
//!
//! Field names serialize as camelCase. Every struct is `#[serde(default)]`,
//! so a settings file only needs the keys it overrides.

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CableSettings {
    /// Settings schema version.
    pub version: String,
    /// Liveness monitor tuning.
    pub monitor: MonitorSettings,
    /// Log output configuration.
    pub logging: LoggingSettings,
}

impl Default for CableSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            monitor: MonitorSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

/// Liveness monitor tuning.
///
/// The stale threshold should exceed twice the server's heartbeat period so
/// that one missed heartbeat is not reported as a dead connection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonitorSettings {
    /// Silence longer than this marks the connection stale.
    pub stale_threshold_ms: u64,
    /// Per-attempt growth rate of the poll interval.
    pub reconnection_backoff_rate: f64,
    /// Cap on the backoff exponent.
    pub max_backoff_exponent: u32,
    /// Delay between a foreground transition and the liveness re-check.
    pub foreground_recheck_delay_ms: u64,
    /// Fixed seed for the jitter generator. `None` seeds from the OS.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jitter_seed: Option<u64>,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            stale_threshold_ms: 6_000,
            reconnection_backoff_rate: 0.15,
            max_backoff_exponent: 10,
            foreground_recheck_delay_ms: 200,
            jitter_seed: None,
        }
    }
}

impl MonitorSettings {
    /// Reject values the monitor cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.stale_threshold_ms == 0 {
            return Err(SettingsError::InvalidValue(
                "monitor.staleThresholdMs must be positive".into(),
            ));
        }
        if !self.reconnection_backoff_rate.is_finite() || self.reconnection_backoff_rate < 0.0 {
            return Err(SettingsError::InvalidValue(format!(
                "monitor.reconnectionBackoffRate must be a non-negative number, got {}",
                self.reconnection_backoff_rate
            )));
        }
        Ok(())
    }
}

/// Log output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    /// Compact text.
    #[default]
    Pretty,
    /// JSON lines.
    Json,
}

/// Log output configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Fallback filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Output format.
    pub format: LogOutput,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogOutput::Pretty,
        }
    }
}

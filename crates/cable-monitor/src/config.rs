//! Monitor tuning parameters.

use std::time::Duration;

use cable_settings::MonitorSettings;

/// Silence longer than this marks a connection stale. Twice the server's
/// heartbeat interval, so a single missed ping is tolerated.
pub const DEFAULT_STALE_THRESHOLD: Duration = Duration::from_secs(6);
/// Per-attempt growth rate of the poll interval.
pub const DEFAULT_BACKOFF_RATE: f64 = 0.15;
/// Backoff stops growing after this many consecutive stale polls.
pub const DEFAULT_MAX_BACKOFF_EXPONENT: u32 = 10;
/// Wait after a foreground transition before re-checking, so the network
/// stack has a chance to come back first.
pub const DEFAULT_FOREGROUND_RECHECK_DELAY: Duration = Duration::from_millis(200);

/// Configuration for [`ConnectionMonitor`](crate::ConnectionMonitor).
#[derive(Clone, Debug, PartialEq)]
pub struct MonitorConfig {
    /// Silence longer than this (strictly) is stale.
    pub stale_threshold: Duration,
    /// Growth rate per consecutive stale poll.
    pub backoff_rate: f64,
    /// Cap on the backoff exponent.
    pub max_backoff_exponent: u32,
    /// Delay before the post-foreground liveness re-check.
    pub foreground_recheck_delay: Duration,
    /// Seed for the jitter generator; `None` seeds from OS entropy.
    pub jitter_seed: Option<u64>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            stale_threshold: DEFAULT_STALE_THRESHOLD,
            backoff_rate: DEFAULT_BACKOFF_RATE,
            max_backoff_exponent: DEFAULT_MAX_BACKOFF_EXPONENT,
            foreground_recheck_delay: DEFAULT_FOREGROUND_RECHECK_DELAY,
            jitter_seed: None,
        }
    }
}

impl MonitorConfig {
    /// Stale threshold in fractional seconds.
    pub fn stale_threshold_secs(&self) -> f64 {
        self.stale_threshold.as_secs_f64()
    }
}

impl From<&MonitorSettings> for MonitorConfig {
    fn from(settings: &MonitorSettings) -> Self {
        Self {
            stale_threshold: Duration::from_millis(settings.stale_threshold_ms),
            backoff_rate: settings.reconnection_backoff_rate,
            max_backoff_exponent: settings.max_backoff_exponent,
            foreground_recheck_delay: Duration::from_millis(settings.foreground_recheck_delay_ms),
            jitter_seed: settings.jitter_seed,
        }
    }
}

//! Poll interval and staleness math.
//!
//! Pure functions; the monitor supplies the clock reading and the random
//! draw so everything here is deterministic under test.
//!
//! Interval formula:
//!
//! ```text
//! backoff    = (1 + rate) ^ min(attempts, max_exponent)
//! jitter_max = 1 if attempts == 0 else rate
//! interval   = threshold * backoff * (1 + jitter_max * random)
//! ```
//!
//! The wide jitter window on the first poll spreads out clients that all
//! connected at once; later polls use a narrow window so backoff dominates.

use std::time::Duration;

use tokio::time::Instant;

use crate::config::MonitorConfig;

/// Multiplicative backoff for the given attempt count.
#[allow(clippy::cast_possible_wrap)]
pub fn backoff_factor(config: &MonitorConfig, reconnect_attempts: u32) -> f64 {
    let exponent = reconnect_attempts.min(config.max_backoff_exponent);
    (1.0 + config.backoff_rate).powi(exponent as i32)
}

/// Upper bound of the jitter multiplier for the given attempt count.
pub fn jitter_max(config: &MonitorConfig, reconnect_attempts: u32) -> f64 {
    if reconnect_attempts == 0 {
        1.0
    } else {
        config.backoff_rate
    }
}

/// Poll interval in milliseconds. `random` must lie in `[0, 1)`.
pub fn poll_interval_ms(config: &MonitorConfig, reconnect_attempts: u32, random: f64) -> f64 {
    let jitter = jitter_max(config, reconnect_attempts) * random;
    config.stale_threshold.as_secs_f64()
        * 1000.0
        * backoff_factor(config, reconnect_attempts)
        * (1.0 + jitter)
}

/// Longest interval [`poll_interval`] will return.
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Poll interval as a [`Duration`], capped at [`MAX_POLL_INTERVAL`].
pub fn poll_interval(config: &MonitorConfig, reconnect_attempts: u32, random: f64) -> Duration {
    let secs = poll_interval_ms(config, reconnect_attempts, random) / 1000.0;
    Duration::try_from_secs_f64(secs)
        .unwrap_or(MAX_POLL_INTERVAL)
        .min(MAX_POLL_INTERVAL)
}

/// Seconds elapsed from `time` to `now`. A missing timestamp is infinitely old.
pub fn seconds_since(time: Option<Instant>, now: Instant) -> f64 {
    match time {
        Some(t) => now.saturating_duration_since(t).as_secs_f64(),
        None => f64::INFINITY,
    }
}

/// Whether `elapsed_secs` of silence exceeds the threshold (strictly).
pub fn is_stale(config: &MonitorConfig, elapsed_secs: f64) -> bool {
    elapsed_secs > config.stale_threshold_secs()
}

//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`CableSettings::default()`]
//! 2. If `~/.cable/settings.json` exists, deep-merge user values over defaults
//! 3. Apply `CABLE_*` environment variable overrides (highest priority)
//! 4. Validate the monitor section

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::types::{CableSettings, LogOutput};

/// Resolve the path to the settings file (`~/.cable/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".cable").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<CableSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults. Invalid JSON or out-of-range values are
/// errors.
pub fn load_settings_from_path(path: &Path) -> Result<CableSettings> {
    let mut settings = load_file_layer(path)?;
    apply_env_overrides(&mut settings);
    settings.monitor.validate()?;
    Ok(settings)
}

/// Defaults merged with the settings file, without env overrides.
fn load_file_layer(path: &Path) -> Result<CableSettings> {
    let defaults = serde_json::to_value(CableSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = match target_map.remove(&key) {
                    Some(target_val) => deep_merge(target_val, source_val),
                    None => source_val,
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `CABLE_*` environment variable overrides.
pub fn apply_env_overrides(settings: &mut CableSettings) {
    apply_overrides_from(settings, |name| std::env::var(name).ok());
}

/// Apply overrides read through `lookup`.
///
/// Values that fail to parse or fall outside their range are ignored with a
/// warning, leaving the file/default value in place.
pub fn apply_overrides_from(settings: &mut CableSettings, lookup: impl Fn(&str) -> Option<String>) {
    let read = |name: &str| lookup(name).filter(|v| !v.is_empty());

    if let Some(v) = read("CABLE_STALE_THRESHOLD_MS") {
        match parse_u64_range(&v, 1_000, 600_000) {
            Some(n) => settings.monitor.stale_threshold_ms = n,
            None => warn_invalid("CABLE_STALE_THRESHOLD_MS", &v),
        }
    }
    if let Some(v) = read("CABLE_BACKOFF_RATE") {
        match parse_f64_range(&v, 0.0, 10.0) {
            Some(n) => settings.monitor.reconnection_backoff_rate = n,
            None => warn_invalid("CABLE_BACKOFF_RATE", &v),
        }
    }
    if let Some(v) = read("CABLE_MAX_BACKOFF_EXPONENT") {
        match parse_u32_range(&v, 0, 64) {
            Some(n) => settings.monitor.max_backoff_exponent = n,
            None => warn_invalid("CABLE_MAX_BACKOFF_EXPONENT", &v),
        }
    }
    if let Some(v) = read("CABLE_FOREGROUND_RECHECK_MS") {
        match parse_u64_range(&v, 0, 60_000) {
            Some(n) => settings.monitor.foreground_recheck_delay_ms = n,
            None => warn_invalid("CABLE_FOREGROUND_RECHECK_MS", &v),
        }
    }
    if let Some(v) = read("CABLE_JITTER_SEED") {
        match v.parse::<u64>() {
            Ok(n) => settings.monitor.jitter_seed = Some(n),
            Err(_) => warn_invalid("CABLE_JITTER_SEED", &v),
        }
    }
    if let Some(v) = read("CABLE_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = read("CABLE_LOG_FORMAT") {
        match parse_log_output(&v) {
            Some(format) => settings.logging.format = format,
            None => warn_invalid("CABLE_LOG_FORMAT", &v),
        }
    }
}

fn warn_invalid(key: &str, value: &str) {
    warn!(key, value, "invalid env var, ignoring");
}

// ── Pure parsing functions ──────────────────────────────────────────────────

/// Parse a string as a `u64` within an inclusive range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.trim().parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

/// Parse a string as a `u32` within an inclusive range.
pub fn parse_u32_range(val: &str, min: u32, max: u32) -> Option<u32> {
    let n: u32 = val.trim().parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

/// Parse a string as a finite `f64` within an inclusive range.
pub fn parse_f64_range(val: &str, min: f64, max: f64) -> Option<f64> {
    let n: f64 = val.trim().parse().ok()?;
    (n.is_finite() && n >= min && n <= max).then_some(n)
}

/// Parse a log output name (`pretty`/`text` or `json`), case-insensitive.
pub fn parse_log_output(val: &str) -> Option<LogOutput> {
    match val.trim().to_lowercase().as_str() {
        "pretty" | "text" => Some(LogOutput::Pretty),
        "json" => Some(LogOutput::Json),
        _ => None,
    }
}

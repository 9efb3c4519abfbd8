//! # cable-settings
//!
//! Layered configuration for the cable workspace.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** - [`CableSettings::default()`]
//! 2. **User file** - `~/.cable/settings.json` (deep-merged over defaults)
//! 3. **Environment variables** - `CABLE_*` overrides (highest priority)

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    apply_env_overrides, apply_overrides_from, deep_merge, load_settings,
    load_settings_from_path, settings_path,
};
pub use types::*;

use std::sync::OnceLock;

static SETTINGS: OnceLock<CableSettings> = OnceLock::new();

/// Get the global settings instance.
///
/// Loads on first call; falls back to compiled defaults if loading fails.
pub fn get_settings() -> &'static CableSettings {
    SETTINGS.get_or_init(|| or_defaults(load_settings()))
}

fn or_defaults(loaded: Result<CableSettings>) -> CableSettings {
    loaded.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load settings, using defaults");
        CableSettings::default()
    })
}

/// Initialize the global settings with a specific value.
///
/// Returns the value back if the global was already initialized.
#[allow(clippy::result_large_err)]
pub fn init_settings(settings: CableSettings) -> std::result::Result<(), CableSettings> {
    SETTINGS.set(settings)
}

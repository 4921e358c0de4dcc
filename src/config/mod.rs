//! Clinic Configuration Module
//!
//! File locations, pipeline gate limits and the login pair, loaded from TOML.
//!
//! ## Loading Order
//!
//! 1. `CLINIC_CONFIG` environment variable (path to TOML file)
//! 2. `clinic_config.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! Call `config::init()` once at startup, then `config::get()` anywhere:
//!
//! ```ignore
//! config::init(ClinicConfig::load());
//!
//! let data_file = &config::get().storage.data_file;
//! ```

mod clinic_config;
pub mod defaults;
pub mod validation;

pub use clinic_config::*;

use std::sync::OnceLock;

static CLINIC_CONFIG: OnceLock<ClinicConfig> = OnceLock::new();

/// Initialize the global configuration. Later calls are ignored.
pub fn init(config: ClinicConfig) {
    if CLINIC_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once, ignoring");
    }
}

/// Get the global configuration, or the built-in defaults when `init()`
/// has not been called.
pub fn get() -> &'static ClinicConfig {
    CLINIC_CONFIG.get_or_init(|| {
        tracing::warn!("config::get() called before config::init(), using defaults");
        ClinicConfig::default()
    })
}

pub fn is_initialized() -> bool {
    CLINIC_CONFIG.get().is_some()
}

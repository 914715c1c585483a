//! Lumen configuration.
//!
//! TOML-based configuration for the demo host: window geometry, initial
//! content, engine options and logging. All sections use defaults, so an
//! empty file (or no file at all) is a valid config.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use lumen_config::{load_config, config_to_json};
//!
//! let config = load_config()?;
//! println!("{}", config_to_json(&config));
//! # Ok::<(), lumen_common::ConfigError>(())
//! ```

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{
    ContentConfig, EngineConfig, LoggingConfig, LumenConfig, WindowConfig, CONFIG_SCHEMA_VERSION,
};

use lumen_common::ConfigError;

/// Load config from the platform default path, creating it if missing.
pub fn load_config() -> Result<LumenConfig, ConfigError> {
    toml_loader::load_default()
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &LumenConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}

use crate::schema::LumenConfig;
use crate::validation;
use lumen_common::ConfigError;
use std::io;
use std::path::Path;
use tracing::{info, warn};

use super::paths::{create_default_config, default_config_path};

/// Parse a config from TOML text.
///
/// Missing fields use serde defaults. Validation problems are logged and
/// the parsed config is returned as-is.
pub fn load_from_str(content: &str) -> Result<LumenConfig, ConfigError> {
    let config: LumenConfig = toml::from_str(content)
        .map_err(|e| ConfigError::ParseError(format!("failed to parse TOML: {e}")))?;

    if let Err(e) = validation::validate(&config) {
        warn!(error = %e, "config validation warning, using parsed values");
    }
    Ok(config)
}

/// Load config from a specific TOML file path.
pub fn load_from_path(path: &Path) -> Result<LumenConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ConfigError::FileNotFound(path.to_path_buf()),
        _ => ConfigError::ParseError(format!("failed to read {}: {e}", path.display())),
    })?;

    let config = load_from_str(&content)?;
    info!(path = %path.display(), "loaded config");
    Ok(config)
}

/// Load config from the platform-specific default path.
///
/// On macOS: `~/Library/Application Support/lumen/config.toml`
/// On Linux: `~/.config/lumen/config.toml`
///
/// If the file does not exist, creates a default config file and returns defaults.
pub fn load_default() -> Result<LumenConfig, ConfigError> {
    let path = default_config_path()?;

    match load_from_path(&path) {
        Ok(config) => Ok(config),
        Err(ConfigError::FileNotFound(_)) => {
            info!(path = %path.display(), "no config found, creating default");
            create_default_config(&path)?;
            Ok(LumenConfig::default())
        }
        Err(e) => Err(e),
    }
}

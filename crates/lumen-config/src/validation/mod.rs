//! Configuration validation.
//!
//! Each section has its own check; this orchestrator calls them all and
//! collects errors into a single `ConfigError`.

mod helpers;
mod sections;

#[cfg(test)]
mod tests;

use crate::schema::LumenConfig;
use lumen_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &LumenConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    sections::validate_window(&mut errors, config);
    sections::validate_content(&mut errors, config);
    sections::validate_engine(&mut errors, config);
    sections::validate_logging(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

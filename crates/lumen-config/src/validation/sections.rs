use crate::schema::{LumenConfig, LOG_LEVELS};
use tracing::warn;

use super::helpers::{validate_not_blank, validate_range};

const MAX_DIMENSION: i32 = 16384;

pub(super) fn validate_window(errors: &mut Vec<String>, config: &LumenConfig) {
    validate_range(errors, "window.width", config.window.width, 1, MAX_DIMENSION);
    validate_range(errors, "window.height", config.window.height, 1, MAX_DIMENSION);
}

pub(super) fn validate_content(errors: &mut Vec<String>, config: &LumenConfig) {
    let content = &config.content;
    validate_not_blank(errors, "content.url", content.url.as_deref());
    if content.url.is_some() && content.html.is_some() {
        // Not an error: url wins.
        warn!("both content.url and content.html are set, html will be ignored");
    }
}

pub(super) fn validate_engine(errors: &mut Vec<String>, config: &LumenConfig) {
    let path = config.engine.library_path.as_ref().and_then(|p| p.to_str());
    validate_not_blank(errors, "engine.library_path", path);
}

pub(super) fn validate_logging(errors: &mut Vec<String>, config: &LumenConfig) {
    let level = config.logging.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(format!(
            "logging.level = {:?} must be one of {}",
            config.logging.level,
            LOG_LEVELS.join(", ")
        ));
    }
}

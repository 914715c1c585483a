//! Tests for the full validation pipeline.

use super::*;
use std::path::PathBuf;

#[test]
fn default_config_validates() {
    assert!(validate(&LumenConfig::default()).is_ok());
}

#[test]
fn catches_zero_width() {
    let mut config = LumenConfig::default();
    config.window.width = 0;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("window.width"));
}

#[test]
fn catches_huge_height() {
    let mut config = LumenConfig::default();
    config.window.height = 100_000;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("window.height"));
}

#[test]
fn catches_blank_url() {
    let mut config = LumenConfig::default();
    config.content.url = Some("  ".into());
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("content.url"));
}

#[test]
fn url_and_html_together_is_allowed() {
    let mut config = LumenConfig::default();
    config.content.url = Some("https://example.com".into());
    config.content.html = Some("<p>unused</p>".into());
    assert!(validate(&config).is_ok());
}

#[test]
fn catches_empty_library_path() {
    let mut config = LumenConfig::default();
    config.engine.library_path = Some(PathBuf::new());
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("engine.library_path"));
}

#[test]
fn log_level_is_case_insensitive() {
    let mut config = LumenConfig::default();
    config.logging.level = "DEBUG".into();
    assert!(validate(&config).is_ok());
}

#[test]
fn catches_unknown_log_level() {
    let mut config = LumenConfig::default();
    config.logging.level = "loud".into();
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("logging.level"));
}

#[test]
fn collects_every_error() {
    let mut config = LumenConfig::default();
    config.window.width = -1;
    config.logging.level = "loud".into();
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("window.width"));
    assert!(err.contains("logging.level"));
}

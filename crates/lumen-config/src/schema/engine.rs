//! Engine configuration types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Options passed to the native engine and the lifecycle controller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Enable the engine's developer tools.
    pub developer_tools: bool,
    /// Run the event loop on a dedicated thread instead of the main one.
    pub async_mode: bool,
    /// Load the engine from this path instead of the platform default.
    pub library_path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_defaults() {
        let config = EngineConfig::default();
        assert!(!config.developer_tools);
        assert!(!config.async_mode);
        assert!(config.library_path.is_none());
    }

    #[test]
    fn engine_from_toml() {
        let config: EngineConfig = toml::from_str(
            r#"
async_mode = true
library_path = "/opt/webview/libwebview.so"
"#,
        )
        .unwrap();
        assert!(config.async_mode);
        assert_eq!(
            config.library_path,
            Some(PathBuf::from("/opt/webview/libwebview.so"))
        );
    }
}

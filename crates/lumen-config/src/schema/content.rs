use serde::{Deserialize, Serialize};

/// Document loaded right after the engine is created.
///
/// `url` wins when both are set. With neither the window shows
/// `about:blank`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    pub url: Option<String>,
    pub html: Option<String>,
}

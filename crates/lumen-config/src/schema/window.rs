//! Window configuration types.

use lumen_common::SizeHint;
use serde::{Deserialize, Serialize};

/// Initial window title and geometry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    /// Width in pixels (valid range: 1-16384).
    pub width: i32,
    /// Height in pixels (valid range: 1-16384).
    pub height: i32,
    pub size_hint: SizeHint,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Lumen".into(),
            width: 800,
            height: 600,
            size_hint: SizeHint::None,
        }
    }
}

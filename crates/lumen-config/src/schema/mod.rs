//! Configuration schema types.
//!
//! All structs use `serde(default)` so partial configs work.

mod content;
mod engine;
mod logging;
mod window;

pub use content::*;
pub use engine::*;
pub use logging::*;
pub use window::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LumenConfig {
    pub window: WindowConfig,
    pub content: ContentConfig,
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
}

//! Shared error taxonomy and small value types used across the Lumen crates.

pub mod errors;
pub mod types;

pub use errors::{ConfigError, LumenError, NativeError, PlatformError};
pub use types::{LifecycleState, RunMode, SizeHint};

pub type Result<T> = std::result::Result<T, LumenError>;

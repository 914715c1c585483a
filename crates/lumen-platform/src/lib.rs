//! OS-specific pieces kept out of the core bridge.
//!
//! - `WindowAdapter`: window cosmetics (dark title bar, maximize,
//!   fullscreen) applied to the engine's native window pointer
//! - `preflight`: checks that must pass before an engine is created

pub mod preflight;
pub mod window;

pub use preflight::preflight;
pub use window::{select_adapter, UnsupportedAdapter, WindowAdapter};

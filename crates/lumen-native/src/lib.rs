//! Native call surface for the webview engine.
//!
//! The engine is an opaque C library exposing a fixed set of `webview_*`
//! entry points. This crate provides:
//! - `NativeApi`, one method per entry point, the seam every higher layer
//!   talks through
//! - `NativeLibrary`, the `libloading`-backed implementation
//! - `TransferBuffer`, the per-call string marshalling buffer
//! - `VersionInfo`, decoded from the engine's fixed-layout version struct
//!
//! Nothing here retries or recovers; errors go straight back to the caller.

mod api;
mod buffer;
mod handle;
mod library;
mod version;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use api::{html_or_empty, url_or_blank, BindFn, DispatchFn, NativeApi, BLANK_URL};
pub use buffer::TransferBuffer;
pub use handle::{EngineHandle, WindowHandle};
pub use library::{default_library_name, shared_library, NativeLibrary};
pub use version::{RawVersionInfo, VersionInfo};

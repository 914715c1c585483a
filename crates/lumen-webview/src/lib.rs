//! Managed webview windows on top of the native `webview` engine.
//!
//! Provides:
//! - `Webview`, one engine instance with a lifecycle and an owning thread
//! - `WebviewBuilder`, configuration applied before the loop starts
//! - Script-to-host calls through `bind`, answered via `webview_return`
//! - `json_escape` and `force_safe_chars` for text crossing into script

mod bindings;
mod builder;
mod dispatcher;
pub(crate) mod hook;
pub mod escape;
pub mod scripts;
mod webview;

pub use bindings::BindResult;
pub use builder::WebviewBuilder;
pub use escape::{force_safe_chars, json_escape};
pub use lumen_common::{LifecycleState, LumenError, RunMode, SizeHint};
pub use webview::Webview;

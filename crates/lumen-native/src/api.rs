use std::ffi::{c_char, c_void};

use lumen_common::{NativeError, SizeHint};

use crate::handle::{EngineHandle, WindowHandle};
use crate::version::VersionInfo;

/// URL loaded when navigation is requested without one.
pub const BLANK_URL: &str = "about:blank";

/// Trampoline the engine calls when script invokes a bound function.
///
/// `seq` identifies the pending call and must be handed back to
/// `webview_return`; `req` is the JSON array of arguments.
pub type BindFn = unsafe extern "C" fn(seq: i64, req: *const c_char, arg: i64);

/// Trampoline the engine calls on its loop thread after `webview_dispatch`.
pub type DispatchFn = unsafe extern "C" fn(engine: *mut c_void, arg: i64);

pub fn url_or_blank(url: Option<&str>) -> &str {
    url.unwrap_or(BLANK_URL)
}

/// A missing document clears the page.
pub fn html_or_empty(html: Option<&str>) -> &str {
    html.unwrap_or("")
}

/// One method per `webview_*` entry point.
///
/// Implementations marshal arguments, make exactly one native call and report
/// what happened. Which thread may call what is the caller's problem: `run`
/// belongs to the owning thread, `dispatch` is safe from anywhere, and
/// `destroy`/`terminate` are not idempotent at this layer.
pub trait NativeApi: Send + Sync {
    /// `webview_create`. A null result is `NativeError::NullHandle`.
    fn create(&self, debug: bool, parent: Option<WindowHandle>)
        -> Result<EngineHandle, NativeError>;

    /// `webview_get_window`.
    fn window(&self, engine: &EngineHandle) -> Result<WindowHandle, NativeError>;

    /// `webview_set_html`. `None` clears the document.
    fn set_html(&self, engine: &EngineHandle, html: Option<&str>) -> Result<(), NativeError>;

    /// `webview_navigate`. `None` navigates to [`BLANK_URL`].
    fn navigate(&self, engine: &EngineHandle, url: Option<&str>) -> Result<(), NativeError>;

    fn set_title(&self, engine: &EngineHandle, title: &str) -> Result<(), NativeError>;

    /// `webview_set_size`. Width and height go through unchecked.
    fn set_size(
        &self,
        engine: &EngineHandle,
        width: i32,
        height: i32,
        hint: SizeHint,
    ) -> Result<(), NativeError>;

    /// `webview_run`. Blocks until the loop terminates.
    fn run(&self, engine: &EngineHandle) -> Result<(), NativeError>;

    fn destroy(&self, engine: &EngineHandle) -> Result<(), NativeError>;

    fn terminate(&self, engine: &EngineHandle) -> Result<(), NativeError>;

    fn eval(&self, engine: &EngineHandle, js: &str) -> Result<(), NativeError>;

    /// `webview_init`: script injected into every new document.
    fn init(&self, engine: &EngineHandle, js: &str) -> Result<(), NativeError>;

    fn bind(
        &self,
        engine: &EngineHandle,
        name: &str,
        trampoline: BindFn,
        arg: i64,
    ) -> Result<(), NativeError>;

    fn unbind(&self, engine: &EngineHandle, name: &str) -> Result<(), NativeError>;

    /// `webview_return`: resolve (or reject, when `is_error`) call `seq`.
    fn return_value(
        &self,
        engine: &EngineHandle,
        seq: i64,
        is_error: bool,
        result: &str,
    ) -> Result<(), NativeError>;

    /// `webview_dispatch`. Only honoured while `run` is blocking.
    fn dispatch(
        &self,
        engine: &EngineHandle,
        trampoline: DispatchFn,
        arg: i64,
    ) -> Result<(), NativeError>;

    fn version(&self) -> Result<VersionInfo, NativeError>;
}

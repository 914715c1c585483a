//! Checks run once, before `webview_create`.
//!
//! Each failure is a `PlatformError::Precondition` carrying a hint the user
//! can act on.

use std::ffi::OsString;

use lumen_common::{PlatformError, RunMode};
use tracing::debug;

/// Verify the current process can host an engine in `mode`.
pub fn preflight(mode: RunMode) -> Result<(), PlatformError> {
    #[cfg(target_os = "macos")]
    {
        let on_main = objc2::MainThreadMarker::new().is_some();
        check_appkit(on_main, mode)?;
    }
    #[cfg(target_os = "linux")]
    {
        check_display(|key| std::env::var_os(key))?;
    }
    debug!(?mode, "platform preflight passed");
    Ok(())
}

/// AppKit only runs its event loop on the process's main thread.
#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
fn check_appkit(on_main_thread: bool, mode: RunMode) -> Result<(), PlatformError> {
    if mode == RunMode::Background {
        return Err(PlatformError::Precondition {
            reason: "background mode is not available on macOS".into(),
            hint: "use blocking mode and call run() from the main thread".into(),
        });
    }
    if !on_main_thread {
        return Err(PlatformError::Precondition {
            reason: "the webview must be created on the main thread on macOS".into(),
            hint: "create and run the webview from main(); when launched through the JVM \
                   or another host, start it with -XstartOnFirstThread or its equivalent"
                .into(),
        });
    }
    Ok(())
}

/// GTK needs a display server to connect to.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn check_display(lookup: impl Fn(&str) -> Option<OsString>) -> Result<(), PlatformError> {
    let present = |key: &str| lookup(key).is_some_and(|v| !v.is_empty());
    if present("DISPLAY") || present("WAYLAND_DISPLAY") {
        return Ok(());
    }
    Err(PlatformError::Precondition {
        reason: "no display server found (DISPLAY and WAYLAND_DISPLAY are unset)".into(),
        hint: "run inside a graphical session, or under xvfb-run for headless use".into(),
    })
}

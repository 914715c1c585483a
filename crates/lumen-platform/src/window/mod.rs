//! Window cosmetics behind one small trait.
//!
//! Each implementation only ever sees the `WindowHandle` the engine hands
//! out. The caller is responsible for invoking these on the owning thread.

use std::sync::Arc;

use lumen_common::PlatformError;
use lumen_native::WindowHandle;

#[cfg(target_os = "macos")]
mod appkit;
#[cfg(target_os = "windows")]
mod win32;

pub trait WindowAdapter: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Switch the window chrome between dark and light.
    fn set_dark_appearance(&self, window: WindowHandle, dark: bool) -> Result<(), PlatformError>;

    fn maximize(&self, window: WindowHandle) -> Result<(), PlatformError>;

    fn fullscreen(&self, window: WindowHandle) -> Result<(), PlatformError>;
}

/// Used where no native implementation exists (Linux/GTK included).
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedAdapter;

impl WindowAdapter for UnsupportedAdapter {
    fn name(&self) -> &'static str {
        "unsupported"
    }

    fn set_dark_appearance(&self, _window: WindowHandle, _dark: bool) -> Result<(), PlatformError> {
        Err(PlatformError::NotSupported("dark appearance".into()))
    }

    fn maximize(&self, _window: WindowHandle) -> Result<(), PlatformError> {
        Err(PlatformError::NotSupported("maximize".into()))
    }

    fn fullscreen(&self, _window: WindowHandle) -> Result<(), PlatformError> {
        Err(PlatformError::NotSupported("fullscreen".into()))
    }
}

/// Pick the adapter for the platform we were built for.
pub fn select_adapter() -> Arc<dyn WindowAdapter> {
    #[cfg(target_os = "windows")]
    {
        Arc::new(win32::Win32Adapter)
    }
    #[cfg(target_os = "macos")]
    {
        Arc::new(appkit::AppKitAdapter)
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        Arc::new(UnsupportedAdapter)
    }
}

#[cfg(any(target_os = "windows", target_os = "macos", test))]
pub(crate) fn require_window(window: WindowHandle, op: &str) -> Result<(), PlatformError> {
    if window.is_null() {
        return Err(PlatformError::WindowOperation(format!(
            "{op}: engine has no native window"
        )));
    }
    Ok(())
}

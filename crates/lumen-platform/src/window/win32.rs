use std::ffi::c_void;

use lumen_common::PlatformError;
use lumen_native::WindowHandle;
use tracing::debug;
use windows::Win32::Foundation::{BOOL, HWND};
use windows::Win32::Graphics::Dwm::{DwmSetWindowAttribute, DWMWA_USE_IMMERSIVE_DARK_MODE};
use windows::Win32::UI::WindowsAndMessaging::{
    GetWindowLongW, SetWindowLongW, ShowWindow, GWL_STYLE, SW_MAXIMIZE, WS_OVERLAPPEDWINDOW,
    WS_POPUP, WS_VISIBLE,
};

use super::{require_window, WindowAdapter};

/// DWM and User32 calls on the engine's HWND.
pub(super) struct Win32Adapter;

fn hwnd(window: WindowHandle) -> HWND {
    HWND(window.as_ptr())
}

impl WindowAdapter for Win32Adapter {
    fn name(&self) -> &'static str {
        "win32"
    }

    fn set_dark_appearance(&self, window: WindowHandle, dark: bool) -> Result<(), PlatformError> {
        require_window(window, "dark appearance")?;
        let value = BOOL::from(dark);
        unsafe {
            DwmSetWindowAttribute(
                hwnd(window),
                DWMWA_USE_IMMERSIVE_DARK_MODE,
                &value as *const BOOL as *const c_void,
                std::mem::size_of::<BOOL>() as u32,
            )
        }
        .map_err(|e| PlatformError::WindowOperation(format!("DwmSetWindowAttribute: {e}")))?;
        debug!(dark, "applied immersive dark mode");
        Ok(())
    }

    fn maximize(&self, window: WindowHandle) -> Result<(), PlatformError> {
        require_window(window, "maximize")?;
        // Return value is the previous visibility, not an error flag.
        let _ = unsafe { ShowWindow(hwnd(window), SW_MAXIMIZE) };
        Ok(())
    }

    fn fullscreen(&self, window: WindowHandle) -> Result<(), PlatformError> {
        require_window(window, "fullscreen")?;
        let hwnd = hwnd(window);
        unsafe {
            let style = GetWindowLongW(hwnd, GWL_STYLE) as u32;
            let borderless = (style & !WS_OVERLAPPEDWINDOW.0) | WS_POPUP.0 | WS_VISIBLE.0;
            SetWindowLongW(hwnd, GWL_STYLE, borderless as i32);
            let _ = ShowWindow(hwnd, SW_MAXIMIZE);
        }
        Ok(())
    }
}

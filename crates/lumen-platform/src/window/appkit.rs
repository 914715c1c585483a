use lumen_common::PlatformError;
use lumen_native::WindowHandle;
use objc2::msg_send;
use objc2::runtime::{AnyClass, AnyObject};
use objc2_foundation::NSString;
use tracing::debug;

use super::{require_window, WindowAdapter};

/// Objective-C messages sent to the engine's `NSWindow`.
pub(super) struct AppKitAdapter;

/// # Safety
/// `window` must point at a live `NSWindow`.
unsafe fn ns_window<'a>(window: WindowHandle) -> &'a AnyObject {
    &*(window.as_ptr() as *const AnyObject)
}

impl WindowAdapter for AppKitAdapter {
    fn name(&self) -> &'static str {
        "appkit"
    }

    fn set_dark_appearance(&self, window: WindowHandle, dark: bool) -> Result<(), PlatformError> {
        require_window(window, "dark appearance")?;
        let class = AnyClass::get(c"NSAppearance")
            .ok_or_else(|| PlatformError::NotSupported("NSAppearance is not available".into()))?;
        let name = NSString::from_str(if dark {
            "NSAppearanceNameDarkAqua"
        } else {
            "NSAppearanceNameAqua"
        });
        unsafe {
            let appearance: *mut AnyObject = msg_send![class, appearanceNamed: &*name];
            if appearance.is_null() {
                return Err(PlatformError::WindowOperation(format!(
                    "no appearance named {name}"
                )));
            }
            let _: () = msg_send![ns_window(window), setAppearance: appearance];
        }
        debug!(dark, "applied window appearance");
        Ok(())
    }

    fn maximize(&self, window: WindowHandle) -> Result<(), PlatformError> {
        require_window(window, "maximize")?;
        unsafe {
            let _: () = msg_send![ns_window(window), zoom: std::ptr::null_mut::<AnyObject>()];
        }
        Ok(())
    }

    fn fullscreen(&self, window: WindowHandle) -> Result<(), PlatformError> {
        require_window(window, "fullscreen")?;
        unsafe {
            let _: () = msg_send![
                ns_window(window),
                toggleFullScreen: std::ptr::null_mut::<AnyObject>()
            ];
        }
        Ok(())
    }
}

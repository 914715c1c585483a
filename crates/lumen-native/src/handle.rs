use std::ffi::c_void;
use std::ptr::NonNull;

/// Opaque pointer to one running engine instance.
///
/// Not `Clone`: the lifecycle controller owns it and everything else borrows.
#[derive(Debug)]
pub struct EngineHandle(NonNull<c_void>);

// The pointer is only an identifier on this side of the boundary. Which
// thread may pass it to which entry point is enforced by the controller.
unsafe impl Send for EngineHandle {}
unsafe impl Sync for EngineHandle {}

impl EngineHandle {
    /// Wrap a pointer returned by `webview_create`.
    ///
    /// # Safety
    /// `ptr` must identify a live engine instance and must not be wrapped twice.
    pub unsafe fn from_raw(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    pub fn as_ptr(&self) -> *mut c_void {
        self.0.as_ptr()
    }
}

/// OS-level window pointer (GtkWindow, NSWindow or HWND).
///
/// Derived read-only from an engine and valid no longer than that engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowHandle(*mut c_void);

unsafe impl Send for WindowHandle {}
unsafe impl Sync for WindowHandle {}

impl WindowHandle {
    pub fn from_raw(ptr: *mut c_void) -> Self {
        Self(ptr)
    }

    pub fn null() -> Self {
        Self(std::ptr::null_mut())
    }

    pub fn as_ptr(&self) -> *mut c_void {
        self.0
    }

    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }
}

use std::ffi::{c_char, CString};

use lumen_common::NativeError;

/// NUL-terminated copy of one string argument, alive for a single native call.
///
/// Build it right before the call and let it drop right after; the memory is
/// released on every path out of the enclosing scope, including `?` returns.
#[derive(Debug)]
pub struct TransferBuffer {
    inner: CString,
}

impl TransferBuffer {
    /// Copy `value` into native memory. `what` names the argument in errors.
    pub fn new(what: &'static str, value: &str) -> Result<Self, NativeError> {
        let inner = CString::new(value).map_err(|e| NativeError::Marshal {
            what,
            reason: format!("interior nul byte at offset {}", e.nul_position()),
        })?;
        Ok(Self { inner })
    }

    pub fn as_ptr(&self) -> *const c_char {
        self.inner.as_ptr()
    }

    /// Length in bytes, without the terminator.
    pub fn len(&self) -> usize {
        self.inner.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

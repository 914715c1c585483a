//! Script-to-host calls.
//!
//! Each `bind` allocates a slot in an arena that lives as long as the
//! engine. The slot's address is the `arg` the engine passes back to
//! [`binding_trampoline`], which runs the handler and answers with
//! `webview_return`. `unbind` only forgets the name: the engine may still
//! hold the slot's address, so slots are freed together at `destroy`.

use std::collections::HashMap;
use std::error::Error;
use std::ffi::{c_char, CStr};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use lumen_common::LumenError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::dispatcher::panic_message;
use crate::escape::{force_safe_chars, json_escape};
use crate::webview::Core;

/// What a bound handler returns.
///
/// `Ok(None)` resolves the script promise with `null`. `Ok(Some(json))`
/// resolves it with `json`, which must already be valid JSON. `Err`
/// rejects it with the error's text.
pub type BindResult = Result<Option<String>, Box<dyn Error + Send + Sync>>;

pub(crate) type Handler = Box<dyn Fn(&str) -> BindResult + Send + Sync + 'static>;

/// Adapt a typed closure into a raw handler.
///
/// The JSON argument array is decoded into `A` (usually a tuple or a
/// `Vec`) and the return value is encoded with `serde_json`.
pub(crate) fn json_handler<A, R, F>(f: F) -> Handler
where
    A: DeserializeOwned,
    R: Serialize,
    F: Fn(A) -> Result<R, Box<dyn Error + Send + Sync>> + Send + Sync + 'static,
{
    Box::new(move |payload: &str| {
        let args: A = serde_json::from_str(payload)?;
        let result = f(args)?;
        Ok(Some(serde_json::to_string(&result)?))
    })
}

pub(crate) struct BindingSlot {
    name: String,
    handler: Handler,
    core: Weak<Core>,
}

impl BindingSlot {
    /// Run the handler for call `seq` and answer the engine.
    fn invoke(&self, seq: i64, raw: &str) {
        let Some(core) = self.core.upgrade() else {
            warn!(seq, name = %self.name, "binding invoked after its webview was dropped");
            return;
        };

        let (is_error, result) = match self.call(raw) {
            Ok(value) => (false, force_safe_chars(value.as_deref().unwrap_or("null"))),
            Err(message) => {
                let escaped = format!("\"{}\"", json_escape(&message));
                let fault = LumenError::CallbackFault {
                    name: self.name.clone(),
                    message,
                };
                error!(seq, error = %fault, "bound callback failed");
                (true, escaped)
            }
        };

        if let Err(e) = core.native.return_value(&core.engine, seq, is_error, &result) {
            error!(seq, name = %self.name, error = %e, "webview_return failed");
        }
    }

    /// Handler output, or the diagnostic text for a failure or panic.
    fn call(&self, raw: &str) -> Result<Option<String>, String> {
        let payload = force_safe_chars(raw);
        debug!(name = %self.name, payload = %payload, "bound callback invoked");
        match panic::catch_unwind(AssertUnwindSafe(|| (self.handler)(&payload))) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(describe_error(&*e)),
            Err(panic) => Err(format!("panicked: {}", panic_message(&*panic))),
        }
    }
}

/// The error's message followed by its `source()` chain, one per line.
fn describe_error(err: &(dyn Error + 'static)) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str("\ncaused by: ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

struct Arena {
    slots: Vec<Box<BindingSlot>>,
    active: HashMap<String, usize>,
    released: bool,
}

pub(crate) struct Bindings {
    arena: Mutex<Arena>,
}

impl Bindings {
    pub(crate) fn new() -> Self {
        Self {
            arena: Mutex::new(Arena {
                slots: Vec::new(),
                active: HashMap::new(),
                released: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Arena> {
        self.arena.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Allocate a slot for `handler` and bind it under `name`.
    ///
    /// Rebinding a name unbinds the previous registration first.
    pub(crate) fn register(
        &self,
        core: &Arc<Core>,
        name: &str,
        handler: Handler,
    ) -> Result<(), LumenError> {
        let mut arena = self.lock();
        if arena.released {
            return Err(LumenError::Closed);
        }
        if arena.active.remove(name).is_some() {
            core.native.unbind(&core.engine, name)?;
        }

        arena.slots.push(Box::new(BindingSlot {
            name: name.to_string(),
            handler,
            core: Arc::downgrade(core),
        }));
        let index = arena.slots.len() - 1;
        let arg = &*arena.slots[index] as *const BindingSlot as usize as i64;

        if let Err(e) = core.native.bind(&core.engine, name, binding_trampoline, arg) {
            // The engine never saw this address.
            arena.slots.pop();
            return Err(e.into());
        }
        arena.active.insert(name.to_string(), index);
        debug!(name, slots = arena.slots.len(), "binding registered");
        Ok(())
    }

    /// Forget `name`. Its slot stays allocated until [`release`](Self::release).
    pub(crate) fn unregister(&self, core: &Core, name: &str) -> Result<(), LumenError> {
        let mut arena = self.lock();
        if arena.released {
            return Err(LumenError::Closed);
        }
        core.native.unbind(&core.engine, name)?;
        if arena.active.remove(name).is_none() {
            debug!(name, "unbind of a name that was not bound");
        }
        Ok(())
    }

    /// Free every slot. Only valid once the engine is destroyed.
    pub(crate) fn release(&self) -> usize {
        let mut arena = self.lock();
        arena.released = true;
        arena.active.clear();
        let count = arena.slots.len();
        arena.slots.clear();
        count
    }

    #[cfg(test)]
    pub(crate) fn slot_count(&self) -> usize {
        self.lock().slots.len()
    }

    #[cfg(test)]
    pub(crate) fn is_bound(&self, name: &str) -> bool {
        self.lock().active.contains_key(name)
    }
}

/// Called by the engine when script invokes a bound function.
unsafe extern "C" fn binding_trampoline(seq: i64, req: *const c_char, arg: i64) {
    // SAFETY: `arg` is the address of a boxed slot in the arena, which is
    // only freed after `webview_destroy`, after which the engine makes no
    // further calls.
    let slot = unsafe { &*(arg as usize as *const BindingSlot) };
    let raw = if req.is_null() {
        "".into()
    } else {
        unsafe { CStr::from_ptr(req) }.to_string_lossy()
    };
    slot.invoke(seq, &raw);
}

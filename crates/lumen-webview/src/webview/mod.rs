//! The managed engine: one `Webview` per native instance.
//!
//! Every engine has exactly one owning thread. In blocking mode that is
//! the thread that built it; in background mode it is a thread spawned for
//! the purpose. Operations that touch the engine run inline when called on
//! the owner and go through the dispatcher otherwise.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use lumen_common::{LifecycleState, LumenError, RunMode, SizeHint};
use lumen_native::{EngineHandle, NativeApi, VersionInfo, WindowHandle};
use lumen_platform::WindowAdapter;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::bindings::{json_handler, BindResult, Bindings, Handler};
use crate::dispatcher::Dispatcher;
use crate::hook::ShutdownHook;
use crate::scripts::{wrap_eval_script, wrap_init_script};

mod create;
mod lifecycle;

#[cfg(test)]
mod tests;

pub(crate) use create::{InitialContent, Options};
use lifecycle::{Lifecycle, StartGate};

/// State shared between the public handle and the owning thread.
pub(crate) struct Core {
    pub(crate) native: Arc<dyn NativeApi>,
    pub(crate) engine: EngineHandle,
    mode: RunMode,
    owner: ThreadId,
    lifecycle: Mutex<Lifecycle>,
    state_changed: Condvar,
    gate: StartGate,
    destroyed: AtomicBool,
    terminated: AtomicBool,
    pub(crate) dispatcher: Dispatcher,
    pub(crate) bindings: Bindings,
    adapter: Arc<dyn WindowAdapter>,
}

impl Core {
    fn is_owner(&self) -> bool {
        thread::current().id() == self.owner
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    fn lock_lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state(&self) -> LifecycleState {
        self.lock_lifecycle().state
    }

    fn window(&self) -> Result<WindowHandle, LumenError> {
        Ok(self.native.window(&self.engine)?)
    }
}

/// A native webview window and its event loop.
///
/// Cheap to share behind an `Arc`; every method takes `&self` and may be
/// called from any thread unless its docs say otherwise.
pub struct Webview {
    core: Arc<Core>,
    hook: Option<ShutdownHook>,
}

impl Webview {
    pub fn state(&self) -> LifecycleState {
        self.core.state()
    }

    pub fn mode(&self) -> RunMode {
        self.core.mode
    }

    /// Call [`shutdown`](Self::shutdown) when the process receives SIGINT
    /// or SIGTERM. Failure to install only loses the hook.
    pub(crate) fn install_shutdown_hook(&mut self) {
        match ShutdownHook::install(Arc::downgrade(&self.core)) {
            Ok(hook) => self.hook = Some(hook),
            Err(e) => warn!(error = %e, "could not install shutdown hook"),
        }
    }

    #[cfg(test)]
    pub(crate) fn has_shutdown_hook(&self) -> bool {
        self.hook.is_some()
    }

    /// Whether the calling thread owns the engine.
    pub fn is_owner_thread(&self) -> bool {
        self.core.is_owner()
    }

    /// The engine's OS window (GtkWindow, NSWindow or HWND).
    pub fn window(&self) -> Result<WindowHandle, LumenError> {
        self.ensure_alive()?;
        self.core.window()
    }

    /// Version of the loaded engine library.
    pub fn version(&self) -> Result<VersionInfo, LumenError> {
        Ok(self.core.native.version()?)
    }

    pub fn set_title(&self, title: &str) -> Result<(), LumenError> {
        let title = title.to_string();
        self.handle_dispatch("set_title", move |core| {
            Ok(core.native.set_title(&core.engine, &title)?)
        })
    }

    /// Resize the window. Width and height are passed through unchecked.
    pub fn set_size_with_hint(
        &self,
        width: i32,
        height: i32,
        hint: SizeHint,
    ) -> Result<(), LumenError> {
        self.handle_dispatch("set_size", move |core| {
            Ok(core.native.set_size(&core.engine, width, height, hint)?)
        })
    }

    pub fn set_size(&self, width: i32, height: i32) -> Result<(), LumenError> {
        self.set_size_with_hint(width, height, SizeHint::None)
    }

    pub fn set_min_size(&self, width: i32, height: i32) -> Result<(), LumenError> {
        self.set_size_with_hint(width, height, SizeHint::Min)
    }

    pub fn set_max_size(&self, width: i32, height: i32) -> Result<(), LumenError> {
        self.set_size_with_hint(width, height, SizeHint::Max)
    }

    /// Resize and stop the user from resizing.
    pub fn set_fixed_size(&self, width: i32, height: i32) -> Result<(), LumenError> {
        self.set_size_with_hint(width, height, SizeHint::Fixed)
    }

    /// Replace the document. `None` clears it.
    pub fn set_html(&self, html: Option<&str>) -> Result<(), LumenError> {
        let html = html.map(str::to_string);
        self.handle_dispatch("set_html", move |core| {
            Ok(core.native.set_html(&core.engine, html.as_deref())?)
        })
    }

    /// Load `url`, or `about:blank` when `None`.
    pub fn navigate(&self, url: Option<&str>) -> Result<(), LumenError> {
        let url = url.map(str::to_string);
        self.handle_dispatch("navigate", move |core| {
            Ok(core.native.navigate(&core.engine, url.as_deref())?)
        })
    }

    /// Inject `script` into every document loaded from now on.
    ///
    /// Unless `allow_nested` is set the script only runs in the top-level
    /// frame. Errors it throws are logged to the page console.
    pub fn set_init_script(&self, script: &str, allow_nested: bool) -> Result<(), LumenError> {
        let wrapped = wrap_init_script(script, allow_nested);
        self.handle_dispatch("set_init_script", move |core| {
            Ok(core.native.init(&core.engine, &wrapped)?)
        })
    }

    pub fn set_init_script_top_only(&self, script: &str) -> Result<(), LumenError> {
        self.set_init_script(script, false)
    }

    /// Evaluate `script` in the current document.
    ///
    /// Always queued, even on the owning thread, so it runs after anything
    /// already queued (navigation, bindings). Before the loop starts it
    /// waits for the loop.
    pub fn eval(&self, script: &str) -> Result<(), LumenError> {
        let wrapped = wrap_eval_script(script);
        let weak = Arc::downgrade(&self.core);
        self.core.dispatcher.submit(
            &*self.core.native,
            &self.core.engine,
            Box::new(move || {
                let Some(core) = weak.upgrade() else { return };
                if core.is_destroyed() {
                    return;
                }
                if let Err(e) = core.native.eval(&core.engine, &wrapped) {
                    error!(error = %e, "webview_eval failed");
                }
            }),
        )
    }

    /// Expose `handler` to script as `window.<name>(...)`.
    ///
    /// The handler receives the call's arguments as a JSON array and runs
    /// on the engine's loop thread. Its errors and panics reject the
    /// script-side promise; they never reach the engine.
    pub fn bind<F>(&self, name: &str, handler: F) -> Result<(), LumenError>
    where
        F: Fn(&str) -> BindResult + Send + Sync + 'static,
    {
        self.bind_handler(name, Box::new(handler))
    }

    /// Typed variant of [`bind`](Self::bind): arguments are decoded into
    /// `A` and the result encoded with `serde_json`.
    pub fn bind_json<A, R, F>(&self, name: &str, f: F) -> Result<(), LumenError>
    where
        A: DeserializeOwned,
        R: Serialize,
        F: Fn(A) -> Result<R, Box<dyn std::error::Error + Send + Sync>> + Send + Sync + 'static,
    {
        self.bind_handler(name, json_handler(f))
    }

    fn bind_handler(&self, name: &str, handler: Handler) -> Result<(), LumenError> {
        let name = name.to_string();
        self.handle_dispatch("bind", move |core| {
            core.bindings.register(core, &name, handler)
        })
    }

    pub fn unbind(&self, name: &str) -> Result<(), LumenError> {
        let name = name.to_string();
        self.handle_dispatch("unbind", move |core| core.bindings.unregister(core, &name))
    }

    /// Run `task` on the owning thread: inline when already there,
    /// otherwise queued for the loop.
    pub fn dispatch<F>(&self, task: F) -> Result<(), LumenError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.handle_dispatch("dispatch", move |_| {
            task();
            Ok(())
        })
    }

    pub fn set_dark_appearance(&self, dark: bool) -> Result<(), LumenError> {
        self.handle_dispatch("set_dark_appearance", move |core| {
            let window = core.window()?;
            Ok(core.adapter.set_dark_appearance(window, dark)?)
        })
    }

    pub fn maximize(&self) -> Result<(), LumenError> {
        self.handle_dispatch("maximize", |core| {
            let window = core.window()?;
            Ok(core.adapter.maximize(window)?)
        })
    }

    pub fn fullscreen(&self) -> Result<(), LumenError> {
        self.handle_dispatch("fullscreen", |core| {
            let window = core.window()?;
            Ok(core.adapter.fullscreen(window)?)
        })
    }

    fn ensure_alive(&self) -> Result<(), LumenError> {
        if self.core.is_destroyed() {
            return Err(LumenError::Closed);
        }
        Ok(())
    }

    /// Execute `op` on the owning thread.
    ///
    /// On the owner it runs now and its error is returned. Elsewhere it is
    /// queued and its error, if any, can only be logged.
    fn handle_dispatch<F>(&self, what: &'static str, op: F) -> Result<(), LumenError>
    where
        F: FnOnce(&Arc<Core>) -> Result<(), LumenError> + Send + 'static,
    {
        if self.core.is_owner() {
            self.ensure_alive()?;
            return op(&self.core);
        }

        let weak = Arc::downgrade(&self.core);
        self.core.dispatcher.submit(
            &*self.core.native,
            &self.core.engine,
            Box::new(move || {
                let Some(core) = weak.upgrade() else { return };
                if core.is_destroyed() {
                    debug!(op = what, "engine destroyed before queued operation ran");
                    return;
                }
                if let Err(e) = op(&core) {
                    error!(op = what, error = %e, "queued operation failed");
                }
            }),
        )
    }
}

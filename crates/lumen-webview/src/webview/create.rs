use std::sync::atomic::AtomicBool;
use std::sync::{mpsc, Arc, Condvar, Mutex};
use std::thread;

use lumen_common::{LifecycleState, LumenError, RunMode, SizeHint};
use lumen_native::{NativeApi, WindowHandle};
use lumen_platform::WindowAdapter;
use tracing::{debug, error, info};

use crate::bindings::Bindings;
use crate::dispatcher::Dispatcher;

use super::lifecycle::{Lifecycle, StartGate};
use super::{Core, Webview};

/// Document shown right after creation. URL takes precedence over HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum InitialContent {
    Url(String),
    Html(String),
    Blank,
}

/// Everything the owning thread needs to create and configure the engine.
#[derive(Clone)]
pub(crate) struct Options {
    pub(crate) title: Option<String>,
    pub(crate) width: i32,
    pub(crate) height: i32,
    pub(crate) size_hint: SizeHint,
    pub(crate) debug: bool,
    pub(crate) parent: Option<WindowHandle>,
    pub(crate) content: InitialContent,
    pub(crate) mode: RunMode,
    pub(crate) thread_name: String,
}

impl Core {
    /// Create the engine on the calling thread, which becomes its owner, and
    /// apply the initial configuration inline.
    fn create(
        native: Arc<dyn NativeApi>,
        adapter: Arc<dyn WindowAdapter>,
        options: &Options,
    ) -> Result<Arc<Self>, LumenError> {
        let engine = native
            .create(options.debug, options.parent)
            .map_err(|e| LumenError::CreationFailed(e.to_string()))?;

        let state = match options.mode {
            RunMode::Blocking => LifecycleState::Created,
            RunMode::Background => LifecycleState::AwaitingStart,
        };
        let core = Arc::new(Self {
            native,
            engine,
            mode: options.mode,
            owner: thread::current().id(),
            lifecycle: Mutex::new(Lifecycle::new(state)),
            state_changed: Condvar::new(),
            gate: StartGate::new(),
            destroyed: AtomicBool::new(false),
            terminated: AtomicBool::new(false),
            dispatcher: Dispatcher::new(),
            bindings: Bindings::new(),
            adapter,
        });

        if let Err(e) = core.apply_options(options) {
            // Nothing else will ever see this engine.
            core.close_without_loop();
            return Err(e);
        }
        info!(mode = ?options.mode, debug = options.debug, "webview engine created");
        Ok(core)
    }

    fn apply_options(&self, options: &Options) -> Result<(), LumenError> {
        if let Some(title) = &options.title {
            self.native.set_title(&self.engine, title)?;
        }
        self.native
            .set_size(&self.engine, options.width, options.height, options.size_hint)?;
        match &options.content {
            InitialContent::Url(url) => self.native.navigate(&self.engine, Some(url))?,
            InitialContent::Html(html) => self.native.set_html(&self.engine, Some(html))?,
            InitialContent::Blank => self.native.navigate(&self.engine, None)?,
        }
        Ok(())
    }
}

impl Webview {
    pub(crate) fn create(
        native: Arc<dyn NativeApi>,
        adapter: Arc<dyn WindowAdapter>,
        options: Options,
    ) -> Result<Self, LumenError> {
        let core = match options.mode {
            RunMode::Blocking => Core::create(native, adapter, &options)?,
            RunMode::Background => spawn_owner(native, adapter, options)?,
        };
        Ok(Self { core, hook: None })
    }
}

/// Start the owning thread for a background engine and wait until the
/// engine exists.
fn spawn_owner(
    native: Arc<dyn NativeApi>,
    adapter: Arc<dyn WindowAdapter>,
    options: Options,
) -> Result<Arc<Core>, LumenError> {
    let (tx, rx) = mpsc::channel();
    let name = options.thread_name.clone();

    thread::Builder::new().name(name.clone()).spawn(move || {
        let core = match Core::create(native, adapter, &options) {
            Ok(core) => core,
            Err(e) => {
                error!(error = %e, "engine creation failed on owner thread");
                let _ = tx.send(Err(e));
                return;
            }
        };
        if tx.send(Ok(Arc::clone(&core))).is_err() {
            // The constructor is gone; nobody can ever start this engine.
            core.close_without_loop();
            return;
        }
        drop(tx);
        core.await_start();
    })?;

    debug!(thread = %name, "owner thread spawned, waiting for engine");
    rx.recv().map_err(|_| {
        LumenError::CreationFailed("owner thread exited before creating the engine".into())
    })?
}

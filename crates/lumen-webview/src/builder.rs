use std::path::PathBuf;
use std::sync::Arc;

use lumen_common::{LumenError, RunMode, SizeHint};
use lumen_native::{shared_library, NativeApi, WindowHandle};
use lumen_platform::{preflight, select_adapter, WindowAdapter};
use tracing::debug;

use crate::webview::{InitialContent, Options, Webview};

const DEFAULT_WIDTH: i32 = 800;
const DEFAULT_HEIGHT: i32 = 600;
const DEFAULT_THREAD_NAME: &str = "lumen-webview";

/// Configures and creates a [`Webview`].
///
/// ```rust,no_run
/// use lumen_webview::WebviewBuilder;
///
/// let webview = WebviewBuilder::new()
///     .title("Hello")
///     .html("<h1>Hi</h1>")
///     .build()?;
/// webview.run()?;
/// # Ok::<(), lumen_common::LumenError>(())
/// ```
pub struct WebviewBuilder {
    title: Option<String>,
    width: i32,
    height: i32,
    size_hint: SizeHint,
    developer_tools: bool,
    parent: Option<WindowHandle>,
    url: Option<String>,
    html: Option<String>,
    mode: RunMode,
    library_path: Option<PathBuf>,
    adapter: Option<Arc<dyn WindowAdapter>>,
    thread_name: String,
    shutdown_hook: bool,
}

impl Default for WebviewBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WebviewBuilder {
    pub fn new() -> Self {
        Self {
            title: None,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            size_hint: SizeHint::None,
            developer_tools: false,
            parent: None,
            url: None,
            html: None,
            mode: RunMode::Blocking,
            library_path: None,
            adapter: None,
            thread_name: DEFAULT_THREAD_NAME.to_string(),
            shutdown_hook: true,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn size(mut self, width: i32, height: i32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn size_hint(mut self, hint: SizeHint) -> Self {
        self.size_hint = hint;
        self
    }

    pub fn developer_tools(mut self, enabled: bool) -> Self {
        self.developer_tools = enabled;
        self
    }

    /// Embed the webview in an existing native window.
    pub fn parent_window(mut self, parent: WindowHandle) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Initial URL. Takes precedence over [`html`](Self::html).
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    pub fn run_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    /// Shorthand for `run_mode(RunMode::Background)`.
    pub fn background(self, enabled: bool) -> Self {
        self.run_mode(if enabled {
            RunMode::Background
        } else {
            RunMode::Blocking
        })
    }

    /// Load the engine from `path` instead of the platform default name.
    /// Only honoured by the first webview built in the process.
    pub fn library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_path = Some(path.into());
        self
    }

    pub fn window_adapter(mut self, adapter: Arc<dyn WindowAdapter>) -> Self {
        self.adapter = Some(adapter);
        self
    }

    /// Name of the owner thread spawned in background mode.
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Shut the webview down on SIGINT or SIGTERM. On by default; a second
    /// signal exits the process. Has no effect off Unix.
    pub fn shutdown_hook(mut self, enabled: bool) -> Self {
        self.shutdown_hook = enabled;
        self
    }

    /// Check platform preconditions, load the engine library and create
    /// the webview.
    pub fn build(self) -> Result<Webview, LumenError> {
        preflight(self.mode)?;
        let library = shared_library(self.library_path.as_deref())?;
        debug!(path = %library.path().display(), "using native library");
        self.build_with(library)
    }

    /// Create the webview on top of an already-open engine implementation.
    /// No platform checks are made.
    pub fn build_with(self, native: Arc<dyn NativeApi>) -> Result<Webview, LumenError> {
        let content = match (self.url, self.html) {
            (Some(url), _) => InitialContent::Url(url),
            (None, Some(html)) => InitialContent::Html(html),
            (None, None) => InitialContent::Blank,
        };
        let options = Options {
            title: self.title,
            width: self.width,
            height: self.height,
            size_hint: self.size_hint,
            debug: self.developer_tools,
            parent: self.parent,
            content,
            mode: self.mode,
            thread_name: self.thread_name,
        };
        let adapter = self.adapter.unwrap_or_else(select_adapter);
        let mut webview = Webview::create(native, adapter, options)?;
        if self.shutdown_hook {
            webview.install_shutdown_hook();
        }
        Ok(webview)
    }
}

use std::ffi::{c_char, c_int, c_void, OsStr};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use libloading::Library;
use lumen_common::{NativeError, SizeHint};
use tracing::{debug, info};

use crate::api::{html_or_empty, url_or_blank, BindFn, DispatchFn, NativeApi};
use crate::buffer::TransferBuffer;
use crate::handle::{EngineHandle, WindowHandle};
use crate::version::{RawVersionInfo, VersionInfo};

type EngineFn = unsafe extern "C" fn(*mut c_void);
type EngineStrFn = unsafe extern "C" fn(*mut c_void, *const c_char);

/// Every entry point, resolved once when the library is opened.
struct Symbols {
    create: unsafe extern "C" fn(c_int, *mut c_void) -> *mut c_void,
    get_window: unsafe extern "C" fn(*mut c_void) -> *mut c_void,
    set_html: EngineStrFn,
    navigate: EngineStrFn,
    set_title: EngineStrFn,
    set_size: unsafe extern "C" fn(*mut c_void, c_int, c_int, c_int),
    run: EngineFn,
    destroy: EngineFn,
    terminate: EngineFn,
    eval: EngineStrFn,
    init: EngineStrFn,
    bind: unsafe extern "C" fn(*mut c_void, *const c_char, BindFn, i64),
    unbind: EngineStrFn,
    return_value: unsafe extern "C" fn(*mut c_void, i64, c_int, *const c_char),
    dispatch: unsafe extern "C" fn(*mut c_void, DispatchFn, i64),
    version: unsafe extern "C" fn() -> *const RawVersionInfo,
}

/// The engine library, opened with `libloading`.
///
/// The function pointers in `symbols` borrow from `_library`, which is why
/// both live and die together here.
pub struct NativeLibrary {
    path: PathBuf,
    symbols: Symbols,
    _library: Library,
}

/// File name of the engine library on the current platform.
pub fn default_library_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "webview.dll"
    } else if cfg!(target_os = "macos") {
        "libwebview.dylib"
    } else {
        "libwebview.so"
    }
}

unsafe fn resolve<T: Copy>(library: &Library, symbol: &'static str) -> Result<T, NativeError> {
    let sym: libloading::Symbol<T> =
        library
            .get(symbol.as_bytes())
            .map_err(|_| NativeError::Linkage {
                symbol: symbol.to_string(),
            })?;
    Ok(*sym)
}

impl NativeLibrary {
    /// Open the engine library and resolve every entry point.
    ///
    /// A missing symbol fails here, not on first use.
    pub fn open(path: impl AsRef<OsStr>) -> Result<Self, NativeError> {
        let path = PathBuf::from(path.as_ref());
        let library = unsafe { Library::new(&path) }.map_err(|e| NativeError::LibraryLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let symbols = unsafe {
            Symbols {
                create: resolve(&library, "webview_create")?,
                get_window: resolve(&library, "webview_get_window")?,
                set_html: resolve(&library, "webview_set_html")?,
                navigate: resolve(&library, "webview_navigate")?,
                set_title: resolve(&library, "webview_set_title")?,
                set_size: resolve(&library, "webview_set_size")?,
                run: resolve(&library, "webview_run")?,
                destroy: resolve(&library, "webview_destroy")?,
                terminate: resolve(&library, "webview_terminate")?,
                eval: resolve(&library, "webview_eval")?,
                init: resolve(&library, "webview_init")?,
                bind: resolve(&library, "webview_bind")?,
                unbind: resolve(&library, "webview_unbind")?,
                return_value: resolve(&library, "webview_return")?,
                dispatch: resolve(&library, "webview_dispatch")?,
                version: resolve(&library, "webview_version")?,
            }
        };

        info!(path = %path.display(), "native webview library loaded");
        Ok(Self {
            path,
            symbols,
            _library: library,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn call_with_str(
        &self,
        f: EngineStrFn,
        engine: &EngineHandle,
        what: &'static str,
        value: &str,
    ) -> Result<(), NativeError> {
        let buf = TransferBuffer::new(what, value)?;
        unsafe { f(engine.as_ptr(), buf.as_ptr()) };
        Ok(())
    }
}

impl NativeApi for NativeLibrary {
    fn create(
        &self,
        debug: bool,
        parent: Option<WindowHandle>,
    ) -> Result<EngineHandle, NativeError> {
        let parent = parent.map_or(std::ptr::null_mut(), |w| w.as_ptr());
        let raw = unsafe { (self.symbols.create)(c_int::from(debug), parent) };
        unsafe { EngineHandle::from_raw(raw) }.ok_or(NativeError::NullHandle("webview_create"))
    }

    fn window(&self, engine: &EngineHandle) -> Result<WindowHandle, NativeError> {
        let raw = unsafe { (self.symbols.get_window)(engine.as_ptr()) };
        Ok(WindowHandle::from_raw(raw))
    }

    fn set_html(&self, engine: &EngineHandle, html: Option<&str>) -> Result<(), NativeError> {
        self.call_with_str(self.symbols.set_html, engine, "html", html_or_empty(html))
    }

    fn navigate(&self, engine: &EngineHandle, url: Option<&str>) -> Result<(), NativeError> {
        self.call_with_str(self.symbols.navigate, engine, "url", url_or_blank(url))
    }

    fn set_title(&self, engine: &EngineHandle, title: &str) -> Result<(), NativeError> {
        self.call_with_str(self.symbols.set_title, engine, "title", title)
    }

    fn set_size(
        &self,
        engine: &EngineHandle,
        width: i32,
        height: i32,
        hint: SizeHint,
    ) -> Result<(), NativeError> {
        unsafe { (self.symbols.set_size)(engine.as_ptr(), width, height, hint.as_raw()) };
        Ok(())
    }

    fn run(&self, engine: &EngineHandle) -> Result<(), NativeError> {
        unsafe { (self.symbols.run)(engine.as_ptr()) };
        Ok(())
    }

    fn destroy(&self, engine: &EngineHandle) -> Result<(), NativeError> {
        unsafe { (self.symbols.destroy)(engine.as_ptr()) };
        Ok(())
    }

    fn terminate(&self, engine: &EngineHandle) -> Result<(), NativeError> {
        unsafe { (self.symbols.terminate)(engine.as_ptr()) };
        Ok(())
    }

    fn eval(&self, engine: &EngineHandle, js: &str) -> Result<(), NativeError> {
        self.call_with_str(self.symbols.eval, engine, "script", js)
    }

    fn init(&self, engine: &EngineHandle, js: &str) -> Result<(), NativeError> {
        self.call_with_str(self.symbols.init, engine, "init script", js)
    }

    fn bind(
        &self,
        engine: &EngineHandle,
        name: &str,
        trampoline: BindFn,
        arg: i64,
    ) -> Result<(), NativeError> {
        let name = TransferBuffer::new("binding name", name)?;
        unsafe { (self.symbols.bind)(engine.as_ptr(), name.as_ptr(), trampoline, arg) };
        Ok(())
    }

    fn unbind(&self, engine: &EngineHandle, name: &str) -> Result<(), NativeError> {
        self.call_with_str(self.symbols.unbind, engine, "binding name", name)
    }

    fn return_value(
        &self,
        engine: &EngineHandle,
        seq: i64,
        is_error: bool,
        result: &str,
    ) -> Result<(), NativeError> {
        let result = TransferBuffer::new("result", result)?;
        unsafe {
            (self.symbols.return_value)(
                engine.as_ptr(),
                seq,
                c_int::from(is_error),
                result.as_ptr(),
            )
        };
        Ok(())
    }

    fn dispatch(
        &self,
        engine: &EngineHandle,
        trampoline: DispatchFn,
        arg: i64,
    ) -> Result<(), NativeError> {
        unsafe { (self.symbols.dispatch)(engine.as_ptr(), trampoline, arg) };
        Ok(())
    }

    fn version(&self) -> Result<VersionInfo, NativeError> {
        let raw = unsafe { (self.symbols.version)() };
        // Points at static storage inside the library.
        let raw = unsafe { raw.as_ref() }.ok_or(NativeError::NullHandle("webview_version"))?;
        Ok(VersionInfo::from(raw))
    }
}

static SHARED: OnceLock<Arc<NativeLibrary>> = OnceLock::new();
static INIT_LOCK: Mutex<()> = Mutex::new(());

/// Process-wide engine library, opened on first use and never unloaded.
///
/// `path` is only consulted by the call that performs the load; later calls
/// get the already-open library back.
pub fn shared_library(path: Option<&Path>) -> Result<Arc<NativeLibrary>, NativeError> {
    if let Some(lib) = SHARED.get() {
        return Ok(Arc::clone(lib));
    }

    let _guard = INIT_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(lib) = SHARED.get() {
        return Ok(Arc::clone(lib));
    }

    let target = path.map_or_else(|| PathBuf::from(default_library_name()), Path::to_path_buf);
    debug!(path = %target.display(), "loading native webview library");
    let lib = Arc::new(NativeLibrary::open(&target)?);
    // Only this thread can be here while the lock is held.
    let _ = SHARED.set(Arc::clone(&lib));
    Ok(lib)
}

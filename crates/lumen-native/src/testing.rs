//! In-process stand-in for the native engine.
//!
//! `FakeEngine` records every call in order and runs a small event loop in
//! `run`: dispatched trampolines execute on the thread blocked in `run`, just
//! like the real engine, until `terminate` is called. Tests can also play the
//! engine's part in the bind protocol with [`FakeEngine::invoke_binding`].

use std::collections::{HashMap, HashSet, VecDeque};
use std::ffi::{c_void, CString};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use lumen_common::{NativeError, SizeHint};

use crate::api::{html_or_empty, url_or_blank, BindFn, DispatchFn, NativeApi};
use crate::handle::{EngineHandle, WindowHandle};
use crate::version::VersionInfo;

const ENGINE_ADDR: usize = 0x1000;
const WINDOW_ADDR: usize = 0x2000;

/// One recorded native call, with the arguments as they would be marshalled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeCall {
    Create { debug: bool, has_parent: bool },
    GetWindow,
    SetHtml(String),
    Navigate(String),
    SetTitle(String),
    SetSize { width: i32, height: i32, hint: SizeHint },
    Run,
    Destroy,
    Terminate,
    Eval(String),
    Init(String),
    Bind(String),
    Unbind(String),
    Return { seq: i64, is_error: bool, result: String },
    Dispatch,
    Version,
}

impl NativeCall {
    fn name(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::GetWindow => "get_window",
            Self::SetHtml(_) => "set_html",
            Self::Navigate(_) => "navigate",
            Self::SetTitle(_) => "set_title",
            Self::SetSize { .. } => "set_size",
            Self::Run => "run",
            Self::Destroy => "destroy",
            Self::Terminate => "terminate",
            Self::Eval(_) => "eval",
            Self::Init(_) => "init",
            Self::Bind(_) => "bind",
            Self::Unbind(_) => "unbind",
            Self::Return { .. } => "return",
            Self::Dispatch => "dispatch",
            Self::Version => "version",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunBehavior {
    /// Process dispatched work until `terminate`.
    UntilTerminated,
    /// Return from `run` straight away, like a window closed instantly.
    ReturnImmediately,
}

#[derive(Default)]
struct FakeState {
    calls: Vec<NativeCall>,
    bindings: HashMap<String, (BindFn, i64)>,
    queue: VecDeque<(DispatchFn, i64)>,
    faults: HashSet<&'static str>,
    create_returns_null: bool,
    terminated: bool,
    running: bool,
    loop_thread: Option<ThreadId>,
    last_size_hint: Option<SizeHint>,
}

pub struct FakeEngine {
    state: Mutex<FakeState>,
    changed: Condvar,
    behavior: RunBehavior,
}

impl Default for FakeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeEngine {
    /// An engine whose loop runs until terminated.
    pub fn new() -> Self {
        Self::with_behavior(RunBehavior::UntilTerminated)
    }

    /// An engine whose loop exits as soon as it is entered.
    pub fn returning_immediately() -> Self {
        Self::with_behavior(RunBehavior::ReturnImmediately)
    }

    fn with_behavior(behavior: RunBehavior) -> Self {
        Self {
            state: Mutex::new(FakeState::default()),
            changed: Condvar::new(),
            behavior,
        }
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make `webview_create` hand back a null pointer.
    pub fn fail_create(&self) {
        self.lock().create_returns_null = true;
    }

    /// Make every later call to `call` (e.g. `"eval"`) fail with a fault.
    pub fn fail_on(&self, call: &'static str) {
        self.lock().faults.insert(call);
    }

    pub fn calls(&self) -> Vec<NativeCall> {
        self.lock().calls.clone()
    }

    /// How many recorded calls have the given name (e.g. `"terminate"`).
    pub fn count(&self, call: &str) -> usize {
        self.lock().calls.iter().filter(|c| c.name() == call).count()
    }

    /// Every `webview_return` so far, as `(seq, is_error, result)`.
    pub fn returns(&self) -> Vec<(i64, bool, String)> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                NativeCall::Return {
                    seq,
                    is_error,
                    result,
                } => Some((*seq, *is_error, result.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn last_size_hint(&self) -> Option<SizeHint> {
        self.lock().last_size_hint
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.lock().bindings.contains_key(name)
    }

    /// Thread that most recently entered `run`.
    pub fn loop_thread(&self) -> Option<ThreadId> {
        self.lock().loop_thread
    }

    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    /// Block until the loop has been entered. Returns `false` on timeout.
    pub fn wait_until_running(&self, timeout: Duration) -> bool {
        self.wait_for(timeout, |s| s.running)
    }

    /// Block until the recorded calls satisfy `pred`. Returns `false` on timeout.
    pub fn wait_for_calls(&self, timeout: Duration, pred: impl Fn(&[NativeCall]) -> bool) -> bool {
        self.wait_for(timeout, |s| pred(&s.calls))
    }

    fn wait_for(&self, timeout: Duration, pred: impl Fn(&FakeState) -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock();
        while !pred(&state) {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            state = self
                .changed
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        true
    }

    /// Play the engine: call the trampoline bound under `name` with `seq`
    /// and `payload`, on the current thread. Returns `false` when nothing is
    /// bound under that name.
    pub fn invoke_binding(&self, name: &str, seq: i64, payload: &str) -> bool {
        let bound = self.lock().bindings.get(name).copied();
        let Some((trampoline, arg)) = bound else {
            return false;
        };
        let Ok(payload) = CString::new(payload) else {
            return false;
        };
        unsafe { trampoline(seq, payload.as_ptr(), arg) };
        true
    }

    /// Same as [`invoke_binding`](Self::invoke_binding) with raw bytes, for
    /// payloads that are not valid UTF-8.
    pub fn invoke_binding_bytes(&self, name: &str, seq: i64, payload: &[u8]) -> bool {
        let bound = self.lock().bindings.get(name).copied();
        let Some((trampoline, arg)) = bound else {
            return false;
        };
        let Ok(payload) = CString::new(payload) else {
            return false;
        };
        unsafe { trampoline(seq, payload.as_ptr(), arg) };
        true
    }

    fn record(&self, call: NativeCall) -> Result<(), NativeError> {
        let name = call.name();
        let mut state = self.lock();
        state.calls.push(call);
        self.changed.notify_all();
        if state.faults.contains(name) {
            return Err(NativeError::Fault {
                call: name,
                reason: "injected fault".into(),
            });
        }
        Ok(())
    }
}

impl NativeApi for FakeEngine {
    fn create(
        &self,
        debug: bool,
        parent: Option<WindowHandle>,
    ) -> Result<EngineHandle, NativeError> {
        self.record(NativeCall::Create {
            debug,
            has_parent: parent.is_some_and(|p| !p.is_null()),
        })?;
        if self.lock().create_returns_null {
            return Err(NativeError::NullHandle("webview_create"));
        }
        unsafe { EngineHandle::from_raw(ENGINE_ADDR as *mut c_void) }
            .ok_or(NativeError::NullHandle("webview_create"))
    }

    fn window(&self, _engine: &EngineHandle) -> Result<WindowHandle, NativeError> {
        self.record(NativeCall::GetWindow)?;
        Ok(WindowHandle::from_raw(WINDOW_ADDR as *mut c_void))
    }

    fn set_html(&self, _engine: &EngineHandle, html: Option<&str>) -> Result<(), NativeError> {
        self.record(NativeCall::SetHtml(html_or_empty(html).to_string()))
    }

    fn navigate(&self, _engine: &EngineHandle, url: Option<&str>) -> Result<(), NativeError> {
        self.record(NativeCall::Navigate(url_or_blank(url).to_string()))
    }

    fn set_title(&self, _engine: &EngineHandle, title: &str) -> Result<(), NativeError> {
        self.record(NativeCall::SetTitle(title.to_string()))
    }

    fn set_size(
        &self,
        _engine: &EngineHandle,
        width: i32,
        height: i32,
        hint: SizeHint,
    ) -> Result<(), NativeError> {
        self.record(NativeCall::SetSize {
            width,
            height,
            hint,
        })?;
        self.lock().last_size_hint = Some(hint);
        Ok(())
    }

    fn run(&self, engine: &EngineHandle) -> Result<(), NativeError> {
        self.record(NativeCall::Run)?;
        {
            let mut state = self.lock();
            state.running = true;
            state.loop_thread = Some(thread::current().id());
            self.changed.notify_all();
        }

        if self.behavior == RunBehavior::UntilTerminated {
            loop {
                let mut state = self.lock();
                if state.terminated {
                    break;
                }
                if let Some((trampoline, arg)) = state.queue.pop_front() {
                    drop(state);
                    unsafe { trampoline(engine.as_ptr(), arg) };
                    continue;
                }
                let _unused = self
                    .changed
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        }

        let mut state = self.lock();
        state.running = false;
        self.changed.notify_all();
        Ok(())
    }

    fn destroy(&self, _engine: &EngineHandle) -> Result<(), NativeError> {
        self.record(NativeCall::Destroy)?;
        self.lock().bindings.clear();
        Ok(())
    }

    fn terminate(&self, _engine: &EngineHandle) -> Result<(), NativeError> {
        self.record(NativeCall::Terminate)?;
        self.lock().terminated = true;
        self.changed.notify_all();
        Ok(())
    }

    fn eval(&self, _engine: &EngineHandle, js: &str) -> Result<(), NativeError> {
        self.record(NativeCall::Eval(js.to_string()))
    }

    fn init(&self, _engine: &EngineHandle, js: &str) -> Result<(), NativeError> {
        self.record(NativeCall::Init(js.to_string()))
    }

    fn bind(
        &self,
        _engine: &EngineHandle,
        name: &str,
        trampoline: BindFn,
        arg: i64,
    ) -> Result<(), NativeError> {
        self.record(NativeCall::Bind(name.to_string()))?;
        self.lock()
            .bindings
            .insert(name.to_string(), (trampoline, arg));
        Ok(())
    }

    fn unbind(&self, _engine: &EngineHandle, name: &str) -> Result<(), NativeError> {
        self.record(NativeCall::Unbind(name.to_string()))?;
        self.lock().bindings.remove(name);
        Ok(())
    }

    fn return_value(
        &self,
        _engine: &EngineHandle,
        seq: i64,
        is_error: bool,
        result: &str,
    ) -> Result<(), NativeError> {
        self.record(NativeCall::Return {
            seq,
            is_error,
            result: result.to_string(),
        })
    }

    fn dispatch(
        &self,
        _engine: &EngineHandle,
        trampoline: DispatchFn,
        arg: i64,
    ) -> Result<(), NativeError> {
        self.record(NativeCall::Dispatch)?;
        self.lock().queue.push_back((trampoline, arg));
        self.changed.notify_all();
        Ok(())
    }

    fn version(&self) -> Result<VersionInfo, NativeError> {
        self.record(NativeCall::Version)?;
        Ok(VersionInfo {
            major: 0,
            minor: 12,
            patch: 0,
            version_number: "0.12.0".into(),
            pre_release: String::new(),
            build_metadata: String::new(),
        })
    }
}

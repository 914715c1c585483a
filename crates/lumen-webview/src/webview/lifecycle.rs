//! Loop entry and exit, close and shutdown.
//!
//! State changes happen under the lifecycle lock. The switch to `Running`
//! and the dispatcher going live happen in the same critical section, so a
//! `close` that sees `Running` can always reach the loop through dispatch.

use std::sync::atomic::Ordering;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use lumen_common::{LifecycleState, LumenError, RunMode};
use tracing::{debug, error, info, warn};

use crate::dispatcher::run_task;

use super::{Core, Webview};

pub(crate) struct Lifecycle {
    pub(crate) state: LifecycleState,
    /// `close` arrived before the loop started.
    interrupt_pending: bool,
    /// `webview_run` returned; the engine is about to be destroyed.
    loop_exited: bool,
}

impl Lifecycle {
    pub(crate) fn new(state: LifecycleState) -> Self {
        Self {
            state,
            interrupt_pending: false,
            loop_exited: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GateSignal {
    Pending,
    Start,
    Cancel,
}

/// Single-use start signal for a background owner thread.
///
/// The first of `open` and `cancel` wins; later signals are ignored.
pub(crate) struct StartGate {
    signal: Mutex<GateSignal>,
    changed: Condvar,
}

impl StartGate {
    pub(crate) fn new() -> Self {
        Self {
            signal: Mutex::new(GateSignal::Pending),
            changed: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, GateSignal> {
        self.signal.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn send(&self, signal: GateSignal) -> bool {
        let mut current = self.lock();
        if *current != GateSignal::Pending {
            return false;
        }
        *current = signal;
        self.changed.notify_all();
        true
    }

    pub(crate) fn open(&self) -> bool {
        self.send(GateSignal::Start)
    }

    pub(crate) fn cancel(&self) -> bool {
        self.send(GateSignal::Cancel)
    }

    /// Block until a signal arrives.
    pub(crate) fn wait(&self) -> GateSignal {
        let mut current = self.lock();
        while *current == GateSignal::Pending {
            current = self
                .changed
                .wait(current)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *current
    }
}

impl Core {
    /// Owner thread of a background engine: park until started or cancelled.
    pub(super) fn await_start(&self) {
        match self.gate.wait() {
            GateSignal::Start => {
                if let Err(e) = self.enter_loop() {
                    error!(error = %e, "webview loop failed");
                }
            }
            GateSignal::Cancel | GateSignal::Pending => {
                debug!("start cancelled, destroying engine without running it");
                self.close_without_loop();
            }
        }
    }

    /// Run the native loop on the owning thread, then tear down.
    fn enter_loop(&self) -> Result<(), LumenError> {
        let deferred = {
            let mut lifecycle = self.lock_lifecycle();
            match lifecycle.state {
                LifecycleState::Running | LifecycleState::Closed => {
                    debug!(state = %lifecycle.state, "run ignored");
                    return Ok(());
                }
                LifecycleState::Created | LifecycleState::AwaitingStart => {}
            }
            if lifecycle.interrupt_pending {
                drop(lifecycle);
                debug!("close requested before the loop started");
                self.close_without_loop();
                return Ok(());
            }
            lifecycle.state = LifecycleState::Running;
            self.dispatcher.go_live()
        };
        self.state_changed.notify_all();

        if !deferred.is_empty() {
            debug!(count = deferred.len(), "running operations queued before start");
        }
        for task in deferred {
            run_task(task);
        }

        info!("entering webview loop");
        let result = self.native.run(&self.engine);
        info!("webview loop exited");
        self.lock_lifecycle().loop_exited = true;

        self.dispatcher.finish();
        let destroyed = self.destroy_once();
        let terminated = self.terminate_once();
        self.set_closed();

        result?;
        destroyed.and(terminated)
    }

    /// Tear down an engine whose loop never ran: destroy only.
    pub(super) fn close_without_loop(&self) {
        self.dispatcher.finish();
        if let Err(e) = self.destroy_once() {
            error!(error = %e, "webview_destroy failed");
        }
        self.set_closed();
    }

    fn destroy_once(&self) -> Result<(), LumenError> {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let result = self.native.destroy(&self.engine);
        let released = self.bindings.release();
        debug!(released, "engine destroyed, binding slots released");
        Ok(result?)
    }

    fn terminate_once(&self) -> Result<(), LumenError> {
        if self.terminated.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        debug!("terminating webview loop");
        Ok(self.native.terminate(&self.engine)?)
    }

    fn set_closed(&self) {
        self.lock_lifecycle().state = LifecycleState::Closed;
        self.state_changed.notify_all();
    }

    pub(super) fn close(self: &Arc<Self>) -> Result<(), LumenError> {
        let mut lifecycle = self.lock_lifecycle();
        match lifecycle.state {
            LifecycleState::Closed => Ok(()),
            LifecycleState::Created => {
                lifecycle.interrupt_pending = true;
                debug!("close before run, loop will be skipped");
                Ok(())
            }
            LifecycleState::AwaitingStart => {
                lifecycle.interrupt_pending = true;
                drop(lifecycle);
                if self.gate.cancel() {
                    debug!("start gate cancelled");
                }
                Ok(())
            }
            LifecycleState::Running => {
                drop(lifecycle);
                self.request_terminate()
            }
        }
    }

    /// `webview_terminate` may be called from any thread, so a running loop
    /// is stopped here without going through the dispatch queue. The lock is
    /// held across the call so it cannot land after the owner's destroy.
    pub(crate) fn shutdown(self: &Arc<Self>) {
        let lifecycle = self.lock_lifecycle();
        let state = lifecycle.state;
        debug!(%state, "shutdown requested");
        match state {
            LifecycleState::Closed => {}
            LifecycleState::Running if lifecycle.loop_exited => {
                debug!("loop already exited, teardown in progress");
            }
            LifecycleState::Running => {
                if let Err(e) = self.terminate_once() {
                    warn!(error = %e, "shutdown could not terminate the webview loop");
                }
            }
            LifecycleState::Created | LifecycleState::AwaitingStart => {
                drop(lifecycle);
                if let Err(e) = self.close() {
                    warn!(error = %e, "shutdown could not close the webview");
                }
            }
        }
    }

    /// Queue `webview_terminate` for the loop.
    fn request_terminate(self: &Arc<Self>) -> Result<(), LumenError> {
        let weak = Arc::downgrade(self);
        let submitted = self.dispatcher.submit(
            &*self.native,
            &self.engine,
            Box::new(move || {
                let Some(core) = weak.upgrade() else { return };
                if let Err(e) = core.terminate_once() {
                    error!(error = %e, "webview_terminate failed");
                }
            }),
        );
        match submitted {
            // The loop exited on its own in the meantime.
            Err(LumenError::Closed) => Ok(()),
            other => other,
        }
    }
}

impl Webview {
    /// Start the event loop.
    ///
    /// Blocking mode: must be called on the owning thread and returns once
    /// the loop has exited and the engine is torn down. Background mode:
    /// signals the owner thread and returns immediately. Calling it again,
    /// or after close, does nothing.
    pub fn run(&self) -> Result<(), LumenError> {
        match self.core.mode {
            RunMode::Blocking => {
                if !self.core.is_owner() {
                    return Err(LumenError::WrongThread("run"));
                }
                self.core.enter_loop()
            }
            RunMode::Background => {
                if self.core.gate.open() {
                    debug!("start signal sent to owner thread");
                } else {
                    debug!("run ignored, owner thread already signalled");
                }
                Ok(())
            }
        }
    }

    /// Ask the loop to stop. Safe to call any number of times, from any
    /// thread.
    ///
    /// Before the loop starts this only records the request: the engine is
    /// destroyed without ever running and `terminate` is never issued.
    pub fn close(&self) -> Result<(), LumenError> {
        self.core.close()
    }

    /// Last-resort stop request, e.g. from a signal handler or exit hook.
    ///
    /// Unlike [`close`](Self::close), a running loop is terminated directly
    /// from the calling thread, so it works even while the loop is stuck in
    /// a handler. Never fails; a no-op once closed.
    pub fn shutdown(&self) {
        self.core.shutdown();
    }

    /// Block until the engine is closed.
    ///
    /// Fails with `WrongThread` when called on the owning thread before the
    /// engine closed, e.g. from a bound handler or dispatched task.
    pub fn wait_closed(&self) -> Result<(), LumenError> {
        self.check_can_wait()?;
        let mut lifecycle = self.core.lock_lifecycle();
        while !lifecycle.state.is_closed() {
            lifecycle = self
                .core
                .state_changed
                .wait(lifecycle)
                .unwrap_or_else(PoisonError::into_inner);
        }
        Ok(())
    }

    /// Like [`wait_closed`](Self::wait_closed) with a deadline. Returns
    /// whether the engine closed in time.
    pub fn wait_closed_timeout(&self, timeout: Duration) -> Result<bool, LumenError> {
        self.check_can_wait()?;
        let deadline = Instant::now() + timeout;
        let mut lifecycle = self.core.lock_lifecycle();
        while !lifecycle.state.is_closed() {
            let now = Instant::now();
            if now >= deadline {
                return Ok(false);
            }
            lifecycle = self
                .core
                .state_changed
                .wait_timeout(lifecycle, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        Ok(true)
    }

    /// The owner can never see its own engine close: in blocking mode it has
    /// not run the loop yet, in background mode it is the loop.
    fn check_can_wait(&self) -> Result<(), LumenError> {
        if self.core.is_owner() && !self.state().is_closed() {
            return Err(LumenError::WrongThread("wait_closed"));
        }
        Ok(())
    }
}

impl Drop for Webview {
    fn drop(&mut self) {
        match self.core.state() {
            LifecycleState::AwaitingStart => {
                if self.core.gate.cancel() {
                    debug!("webview dropped before start, cancelling owner thread");
                }
            }
            LifecycleState::Created if self.core.is_owner() => {
                debug!("webview dropped before run, destroying engine");
                self.core.close_without_loop();
            }
            LifecycleState::Created => {
                warn!("webview dropped off its owning thread before run, engine leaked");
            }
            LifecycleState::Running | LifecycleState::Closed => {}
        }
    }
}

//! Work handed to the owning thread from elsewhere.
//!
//! Tasks go into our own FIFO. While the loop is live, each task is paired
//! with exactly one `webview_dispatch` whose trampoline pops exactly one
//! task, so execution order is submission order no matter how the engine
//! orders its callbacks. Before the loop starts, tasks are held and run on
//! the owning thread right before `webview_run`. After the loop exits,
//! submissions are refused.

use std::collections::VecDeque;
use std::ffi::c_void;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Mutex, MutexGuard, PoisonError};

use lumen_common::LumenError;
use lumen_native::{EngineHandle, NativeApi};
use tracing::{debug, error, trace};

pub(crate) type Task = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Loop not entered yet; tasks wait in the queue.
    Deferred,
    /// Loop running; every queued task has a native dispatch in flight.
    Live,
    /// Loop exited or never will run.
    Finished,
}

struct Queue {
    phase: Phase,
    tasks: VecDeque<Task>,
}

pub(crate) struct Dispatcher {
    queue: Mutex<Queue>,
}

impl Dispatcher {
    pub(crate) fn new() -> Self {
        Self {
            queue: Mutex::new(Queue {
                phase: Phase::Deferred,
                tasks: VecDeque::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue `task` for the owning thread.
    ///
    /// `self` must stay at a fixed address until the loop exits: its address
    /// is the argument the engine hands back to [`dispatch_trampoline`].
    pub(crate) fn submit(
        &self,
        native: &dyn NativeApi,
        engine: &EngineHandle,
        task: Task,
    ) -> Result<(), LumenError> {
        let mut queue = self.lock();
        match queue.phase {
            Phase::Deferred => {
                queue.tasks.push_back(task);
                trace!(pending = queue.tasks.len(), "task deferred until loop start");
                Ok(())
            }
            Phase::Live => {
                queue.tasks.push_back(task);
                // Held across the call so a failed dispatch can take back
                // exactly the task it pushed.
                let arg = self as *const Dispatcher as usize as i64;
                if let Err(e) = native.dispatch(engine, dispatch_trampoline, arg) {
                    queue.tasks.pop_back();
                    return Err(e.into());
                }
                Ok(())
            }
            Phase::Finished => {
                debug!("task submitted after the loop exited, dropping it");
                Err(LumenError::Closed)
            }
        }
    }

    /// Switch to live dispatch and hand back everything queued so far.
    ///
    /// Called on the owning thread right before entering the loop; the
    /// caller runs the returned tasks in order.
    pub(crate) fn go_live(&self) -> Vec<Task> {
        let mut queue = self.lock();
        queue.phase = Phase::Live;
        queue.tasks.drain(..).collect()
    }

    /// Refuse further work and drop whatever the engine never got to.
    pub(crate) fn finish(&self) {
        let dropped = {
            let mut queue = self.lock();
            queue.phase = Phase::Finished;
            std::mem::take(&mut queue.tasks)
        };
        if !dropped.is_empty() {
            debug!(count = dropped.len(), "dropping tasks that never ran");
        }
    }

    /// Pop and run the oldest task, if any.
    pub(crate) fn run_next(&self) {
        let task = self.lock().tasks.pop_front();
        if let Some(task) = task {
            run_task(task);
        }
    }

    #[cfg(test)]
    pub(crate) fn pending(&self) -> usize {
        self.lock().tasks.len()
    }
}

/// Run a task, keeping a panic from unwinding into the caller.
///
/// The caller is either our own code on the owning thread or the engine's
/// event loop; neither can handle an unwind.
pub(crate) fn run_task(task: Task) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
        error!(panic = %panic_message(&*payload), "dispatched task panicked");
    }
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with a non-string payload".to_string()
    }
}

/// Called by the engine on its loop thread, once per `webview_dispatch`.
unsafe extern "C" fn dispatch_trampoline(_engine: *mut c_void, arg: i64) {
    // SAFETY: `arg` is the address of a `Dispatcher` owned by a `Core` that
    // the owning thread keeps alive for as long as the loop runs.
    let dispatcher = unsafe { &*(arg as usize as *const Dispatcher) };
    dispatcher.run_next();
}

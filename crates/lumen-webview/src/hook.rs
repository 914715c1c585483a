//! Process shutdown hook: stop the engine when the process is asked to exit.
//!
//! The first SIGINT or SIGTERM calls [`Webview::shutdown`](crate::Webview::shutdown)
//! and lets the host return normally once the loop exits. A second signal
//! exits the process straight away.

use std::sync::Weak;

use tracing::warn;

use crate::webview::Core;

/// What to do after a termination signal was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SignalAction {
    /// Shutdown was requested; wait for the loop to exit.
    Wait,
    /// Nothing left to stop, or the loop ignored an earlier request.
    Exit,
}

pub(crate) fn on_termination_signal(core: &Weak<Core>, repeated: bool) -> SignalAction {
    if repeated {
        warn!("termination signal received again, exiting");
        return SignalAction::Exit;
    }
    match core.upgrade() {
        Some(core) => {
            warn!("termination signal received, shutting down webview");
            core.shutdown();
            SignalAction::Wait
        }
        None => SignalAction::Exit,
    }
}

#[cfg(unix)]
pub(crate) use unix::ShutdownHook;

#[cfg(unix)]
mod unix {
    use std::io;
    use std::sync::Weak;
    use std::thread::JoinHandle;

    use signal_hook::consts::signal::{SIGINT, SIGTERM};
    use signal_hook::iterator::{Handle, Signals};
    use tracing::debug;

    use super::{on_termination_signal, SignalAction};
    use crate::webview::Core;

    /// Signal listener thread, stopped and joined on drop.
    pub(crate) struct ShutdownHook {
        handle: Handle,
        thread: Option<JoinHandle<()>>,
    }

    impl ShutdownHook {
        pub(crate) fn install(core: Weak<Core>) -> io::Result<Self> {
            let mut signals = Signals::new([SIGINT, SIGTERM]).map_err(io::Error::other)?;
            let handle = signals.handle();
            let thread = std::thread::Builder::new()
                .name("lumen-shutdown-hook".into())
                .spawn(move || {
                    let mut repeated = false;
                    for signal in signals.forever() {
                        if on_termination_signal(&core, repeated) == SignalAction::Exit {
                            std::process::exit(128 + signal);
                        }
                        repeated = true;
                    }
                })?;
            debug!("shutdown hook installed");
            Ok(Self {
                handle,
                thread: Some(thread),
            })
        }
    }

    impl Drop for ShutdownHook {
        fn drop(&mut self) {
            self.handle.close();
            if let Some(thread) = self.thread.take() {
                let _ = thread.join();
            }
        }
    }
}

/// No signal listener off Unix; the host has to call `shutdown` itself.
#[cfg(not(unix))]
pub(crate) struct ShutdownHook;

#[cfg(not(unix))]
impl ShutdownHook {
    pub(crate) fn install(_core: Weak<Core>) -> std::io::Result<Self> {
        tracing::debug!("shutdown hook is not supported on this platform");
        Ok(Self)
    }
}

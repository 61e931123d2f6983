//! Signal dispositions at the two process boundaries.
//!
//! The interpreter installs flag-setting handlers once at startup; every
//! spawned child re-installs its own dispositions between fork and exec. The
//! interpreter-side handlers do nothing but set an `AtomicBool` — every
//! observable effect (the foreground-only toggle message, orderly shutdown) is
//! applied when the prompt loop regains control, so handler output never
//! interleaves with a running foreground child.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use nix::sys::signal::{self, SigHandler, Signal};
use signal_hook::consts::{SIGINT, SIGTERM, SIGTSTP};

/// Behavior a process exhibits upon receiving a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Restore the signal's default behavior.
    Default,
    /// Discard the signal entirely.
    Ignore,
}

/// Dispositions a spawned child installs before replacing its process image:
/// the interrupt signal goes back to default so a foreground program can be
/// interrupted, and the stop signal is ignored so no child — foreground or
/// background — reacts to the interactive toggle.
pub const CHILD_DISPOSITIONS: [(Signal, Disposition); 2] = [
    (Signal::SIGINT, Disposition::Default),
    (Signal::SIGTSTP, Disposition::Ignore),
];

/// Apply [`CHILD_DISPOSITIONS`] to the current process.
///
/// Meant to run in the child between fork and exec (a `pre_exec` hook), which
/// is why it reports failures as `io::Error` rather than panicking.
pub fn apply_child_dispositions() -> io::Result<()> {
    for (sig, disposition) in CHILD_DISPOSITIONS {
        let handler = match disposition {
            Disposition::Default => SigHandler::SigDfl,
            Disposition::Ignore => SigHandler::SigIgn,
        };
        // Safety: only replaces the handler with SIG_DFL/SIG_IGN, and the
        // child has not exec'd yet.
        unsafe { signal::signal(sig, handler) }
            .map_err(|errno| io::Error::from_raw_os_error(errno as i32))?;
    }
    Ok(())
}

/// Interpreter-side signal state, shared with the registered handlers.
///
/// Cloning is cheap and shares the underlying flags.
#[derive(Debug, Clone, Default)]
pub struct SignalFlags {
    stop_pending: Arc<AtomicBool>,
    term_pending: Arc<AtomicBool>,
    interrupt_seen: Arc<AtomicBool>,
}

impl SignalFlags {
    /// Register the interpreter's handlers for the interrupt, stop, and
    /// termination-request signals.
    ///
    /// The interrupt registration exists so the interpreter itself survives
    /// the signal; its flag is recorded but never acted on.
    pub fn install() -> io::Result<Self> {
        let flags = Self::default();
        signal_hook::flag::register(SIGTSTP, Arc::clone(&flags.stop_pending))?;
        signal_hook::flag::register(SIGTERM, Arc::clone(&flags.term_pending))?;
        signal_hook::flag::register(SIGINT, Arc::clone(&flags.interrupt_seen))?;
        Ok(flags)
    }

    /// Consume a pending stop-signal toggle, if one arrived since the last
    /// call. Each delivered stop signal yields exactly one toggle.
    pub fn take_stop_toggle(&self) -> bool {
        self.stop_pending.swap(false, Ordering::SeqCst)
    }

    /// Whether a termination request has arrived. Not consumed: once set,
    /// shutdown is underway.
    pub fn termination_requested(&self) -> bool {
        self.term_pending.load(Ordering::SeqCst)
    }

    /// Whether an interrupt signal has arrived since startup. Recorded only
    /// because registering the handler is what keeps the interpreter alive
    /// through the signal; nothing makes decisions on it.
    pub fn interrupt_seen(&self) -> bool {
        self.interrupt_seen.load(Ordering::SeqCst)
    }

    #[cfg(test)]
    fn raise_stop(&self) {
        self.stop_pending.store(true, Ordering::SeqCst);
    }
}

//! Interpreter-wide mutable state: the last foreground status, the
//! foreground-only flag, and the bounded table of background children.
//!
//! All three live for the lifetime of the interpreter and are passed by
//! reference into the dispatcher and the built-ins instead of living in
//! globals, keeping a single writer per field.

use std::fmt;
use std::os::unix::process::ExitStatusExt;
use std::process::{Child, ExitStatus};

/// Upper bound on concurrently tracked background children.
pub const MAX_BACKGROUND_JOBS: usize = 10;

/// How the most recent foreground (or reaped background) command ended.
///
/// Built-in commands never touch this; before any external command has run it
/// reads as `exit value 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LastStatus {
    /// The child exited normally with the given code.
    Exited(i32),
    /// The child was terminated by the given signal number.
    Signaled(i32),
}

impl Default for LastStatus {
    fn default() -> Self {
        LastStatus::Exited(0)
    }
}

impl fmt::Display for LastStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LastStatus::Exited(code) => write!(f, "exit value {code}"),
            LastStatus::Signaled(signo) => write!(f, "terminated by signal {signo}"),
        }
    }
}

impl From<ExitStatus> for LastStatus {
    fn from(status: ExitStatus) -> Self {
        match status.code() {
            Some(code) => LastStatus::Exited(code),
            // No exit code on Unix means signal termination.
            None => LastStatus::Signaled(status.signal().unwrap_or(-1)),
        }
    }
}

/// One tracked background child.
#[derive(Debug)]
pub struct Job {
    pid: u32,
    child: Child,
}

/// The job table is full; the unregistered child is handed back so the caller
/// can still wait on or kill it.
#[derive(Debug)]
pub struct CapacityError(pub Child);

impl fmt::Display for CapacityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "background job table is full ({MAX_BACKGROUND_JOBS} jobs)"
        )
    }
}

impl std::error::Error for CapacityError {}

/// Bounded collection of background children awaiting reaping.
///
/// Overflow is an explicit error, never a silent drop: callers reap first and
/// reject the background request when the table is still full.
#[derive(Debug, Default)]
pub struct JobTable {
    jobs: Vec<Job>,
}

impl JobTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Whether another background child can be tracked without overflow.
    pub fn has_capacity(&self) -> bool {
        self.jobs.len() < MAX_BACKGROUND_JOBS
    }

    /// Start tracking a spawned background child.
    pub fn register(&mut self, child: Child) -> Result<u32, CapacityError> {
        if !self.has_capacity() {
            return Err(CapacityError(child));
        }
        let pid = child.id();
        self.jobs.push(Job { pid, child });
        Ok(pid)
    }

    /// Non-blocking reap sweep over every tracked child.
    ///
    /// Finished children are removed from the table and returned with their
    /// termination status; still-running children are left untouched. Never
    /// blocks, so the prompt is not starved.
    pub fn reap_finished(&mut self) -> Vec<(u32, LastStatus)> {
        let mut done = Vec::new();
        self.jobs.retain_mut(|job| match job.child.try_wait() {
            Ok(Some(status)) => {
                done.push((job.pid, LastStatus::from(status)));
                false
            }
            Ok(None) => true,
            // The child is gone in a way we can no longer observe; drop it.
            Err(_) => false,
        });
        done
    }

    /// Kill and reap every tracked child. Used at interpreter shutdown.
    pub fn kill_all(&mut self) {
        for job in &mut self.jobs {
            // Already-dead children make kill fail; nothing to do about it.
            let _ = job.child.kill();
            let _ = job.child.wait();
        }
        self.jobs.clear();
    }
}

/// The interpreter's process-wide state, threaded by `&mut` through the
/// dispatcher and the built-ins.
#[derive(Debug, Default)]
pub struct ShellState {
    /// Status of the most recent completed foreground or reaped background
    /// command. Read by the `status` built-in.
    pub last_status: LastStatus,
    /// While set, background requests are demoted to foreground and child
    /// streams default to a null sink.
    pub foreground_only: bool,
    /// Background children awaiting completion.
    pub jobs: JobTable,
}

impl ShellState {
    pub fn new() -> Self {
        Self::default()
    }
}

//! The execution dispatcher and the interactive prompt loop.
//!
//! A command cycle goes `Idle → Classify → {BuiltinRun, ExternalSpawn} → Idle`:
//! tokenize the line, shape it into a [`Command`], run it as a built-in when
//! the name matches, otherwise spawn an external process — synchronously for
//! foreground commands, tracked in the job table for background ones.

use crate::builtin;
use crate::lexer;
use crate::parser::{self, Command, RedirectSpec};
use crate::signals::{self, SignalFlags};
use crate::state::{LastStatus, ShellState};
use anyhow::{Context, Result, bail};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::process::CommandExt;
use std::process::{Command as ChildCommand, Stdio};

/// The interactive prompt.
pub const PROMPT: &str = ": ";

/// Whether the interactive loop keeps going after a command cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// A line-oriented command interpreter with a foreground/background execution
/// model.
///
/// One `Interpreter` owns the process-wide [`ShellState`] and the installed
/// [`SignalFlags`]; [`Interpreter::repl`] drives the prompt loop, while
/// [`Interpreter::execute_line`] runs a single command cycle against an
/// explicit output sink (which is what the tests use).
pub struct Interpreter {
    state: ShellState,
    signals: SignalFlags,
    pid: u32,
}

impl Interpreter {
    pub fn new(signals: SignalFlags) -> Self {
        Self {
            state: ShellState::new(),
            signals,
            pid: std::process::id(),
        }
    }

    /// Read-only view of the interpreter state.
    pub fn state(&self) -> &ShellState {
        &self.state
    }

    /// The interactive Read-Eval-Print Loop.
    ///
    /// Per iteration: report reaped background children, apply a deferred
    /// stop-signal toggle, honor a pending termination request, then read and
    /// dispatch one line. Returning `Ok(())` means an orderly exit (the `exit`
    /// built-in, end of input, or a termination request).
    pub fn repl(&mut self) -> Result<()> {
        let mut rl = DefaultEditor::new()?;
        let mut stdout = std::io::stdout();

        loop {
            self.poll_events(&mut stdout)?;
            if self.signals.termination_requested() {
                self.state.jobs.kill_all();
                return Ok(());
            }

            match rl.readline(PROMPT) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str())?;
                    }
                    // A stop signal delivered while the line was being typed
                    // must take effect before this command dispatches.
                    if self.signals.take_stop_toggle() {
                        self.toggle_foreground_only(&mut stdout)?;
                    }
                    match self.execute_line(&line, &mut stdout) {
                        Ok(Flow::Continue) => {}
                        Ok(Flow::Exit) => return Ok(()),
                        // User and resource errors end the cycle, never the shell.
                        Err(err) => eprintln!("jobsh: {err:#}"),
                    }
                }
                // Interrupt at the prompt is a no-op cycle.
                Err(ReadlineError::Interrupted) => {}
                Err(ReadlineError::Eof) => {
                    self.state.jobs.kill_all();
                    return Ok(());
                }
                // A signal interrupted the read; loop around so the pending
                // flag work is observed.
                Err(ReadlineError::Io(err))
                    if err.kind() == std::io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Run one full command cycle: tokenize, shape, classify, dispatch.
    pub fn execute_line(&mut self, line: &str, stdout: &mut dyn Write) -> Result<Flow> {
        let words = lexer::split_words(line, self.pid)?;
        if words.is_empty() {
            return Ok(Flow::Continue);
        }

        let cmd = parser::parse_command(words)?;
        let Some(name) = cmd.name() else {
            return Ok(Flow::Continue);
        };

        let args: Vec<&str> = cmd.argv[1..].iter().map(|s| s.as_str()).collect();
        if let Some(result) = builtin::dispatch(name, &args, &mut self.state, stdout) {
            return result;
        }

        self.run_external(cmd, stdout)?;
        Ok(Flow::Continue)
    }

    /// Report every background child that finished since the last call, then
    /// apply a deferred foreground-only toggle. Runs at the prompt boundary so
    /// the output never interleaves with a foreground child's.
    pub fn poll_events(&mut self, stdout: &mut dyn Write) -> Result<()> {
        for (pid, status) in self.state.jobs.reap_finished() {
            writeln!(stdout, "background pid {pid} is done: {status}")?;
            self.state.last_status = status;
        }
        if self.signals.take_stop_toggle() {
            self.toggle_foreground_only(stdout)?;
        }
        Ok(())
    }

    /// Flip foreground-only mode and announce the new state.
    pub fn toggle_foreground_only(&mut self, stdout: &mut dyn Write) -> Result<()> {
        self.state.foreground_only = !self.state.foreground_only;
        if self.state.foreground_only {
            writeln!(stdout, "Entering foreground-only mode (& is now ignored)")?;
        } else {
            writeln!(stdout, "Exiting foreground-only mode")?;
        }
        Ok(())
    }

    /// Spawn an external command, foreground or background.
    fn run_external(&mut self, cmd: Command, stdout: &mut dyn Write) -> Result<()> {
        // A background request while foreground-only is silently a foreground
        // request; the `&` was already stripped by the parser.
        let background = cmd.background && !self.state.foreground_only;

        if background {
            // Reap before registering; the bounded table must never overflow
            // silently.
            self.poll_events(stdout)?;
            if !self.state.jobs.has_capacity() {
                bail!(
                    "{}: background job table is full, command not started",
                    cmd.argv[0]
                );
            }
        }

        let mut child_cmd = ChildCommand::new(&cmd.argv[0]);
        child_cmd.args(&cmd.argv[1..]);

        if let Err(err) = configure_stdio(
            &mut child_cmd,
            &cmd.redirect,
            self.state.foreground_only,
        ) {
            // The failed command still counts as the last foreground outcome.
            self.state.last_status = LastStatus::Exited(1);
            return Err(err);
        }

        unsafe {
            child_cmd.pre_exec(signals::apply_child_dispositions);
        }

        let mut child = match child_cmd.spawn() {
            Ok(child) => child,
            Err(err) => {
                // Unknown command name or failed process creation: the cycle
                // fails, the interpreter carries on.
                self.state.last_status = LastStatus::Exited(1);
                bail!("{}: {err}", cmd.argv[0]);
            }
        };

        if background {
            match self.state.jobs.register(child) {
                Ok(pid) => {
                    writeln!(stdout, "background pid is {pid}")?;
                }
                Err(err) => {
                    let msg = err.to_string();
                    let mut rejected = err.0;
                    let _ = rejected.kill();
                    let _ = rejected.wait();
                    bail!("{}: {msg}", cmd.argv[0]);
                }
            }
            return Ok(());
        }

        let status = child
            .wait()
            .with_context(|| format!("{}: wait failed", cmd.argv[0]))?;
        let last = LastStatus::from(status);
        if let LastStatus::Signaled(signo) = last {
            // Reported immediately, before the next prompt.
            writeln!(stdout, "terminated by signal {signo}")?;
        }
        self.state.last_status = last;
        Ok(())
    }
}

/// Bind the child's standard streams per the [`RedirectSpec`].
///
/// Opened files become the child's stdio via dup2 after process creation; the
/// interpreter's own descriptors are never touched. In foreground-only mode,
/// streams without an explicit redirection go to a null sink.
fn configure_stdio(
    child_cmd: &mut ChildCommand,
    redirect: &RedirectSpec,
    foreground_only: bool,
) -> Result<()> {
    match &redirect.input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("cannot open {} for input", path.display()))?;
            child_cmd.stdin(Stdio::from(file));
        }
        None if foreground_only => {
            child_cmd.stdin(Stdio::null());
        }
        None => {}
    }
    match &redirect.output {
        Some(path) => {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o644)
                .open(path)
                .with_context(|| format!("cannot open {} for output", path.display()))?;
            child_cmd.stdout(Stdio::from(file));
        }
        None if foreground_only => {
            child_cmd.stdout(Stdio::null());
        }
        None => {}
    }
    Ok(())
}

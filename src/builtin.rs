//! Built-in commands: `exit`, `cd`, `pwd`, and `status`.
//!
//! Built-ins are parsed with the [`argh`] crate (`FromArgs`) and executed
//! directly in-process, never by spawning a child. They do not count as
//! foreground processes: none of them writes the last-status record.

use crate::interpreter::Flow;
use crate::state::ShellState;
use anyhow::{Context, Result};
use argh::{EarlyExit, FromArgs};
use std::env;
use std::io::Write;
use std::path::PathBuf;

/// A command implemented by the interpreter itself.
pub(crate) trait Builtin: FromArgs {
    /// Canonical name of the command, e.g. "cd" or "status".
    fn name() -> &'static str;

    /// Execute against the interpreter state, writing any output to `stdout`.
    fn run(self, state: &mut ShellState, stdout: &mut dyn Write) -> Result<Flow>;
}

/// Try to execute `name` as a built-in.
///
/// Returns `None` when `name` is not a built-in, so the caller falls through
/// to external dispatch. Malformed built-in arguments print argh's usage text
/// and complete the cycle without touching interpreter state.
pub fn dispatch(
    name: &str,
    args: &[&str],
    state: &mut ShellState,
    stdout: &mut dyn Write,
) -> Option<Result<Flow>> {
    try_builtin::<Exit>(name, args, state, stdout)
        .or_else(|| try_builtin::<Cd>(name, args, state, stdout))
        .or_else(|| try_builtin::<Pwd>(name, args, state, stdout))
        .or_else(|| try_builtin::<Status>(name, args, state, stdout))
}

fn try_builtin<T: Builtin>(
    name: &str,
    args: &[&str],
    state: &mut ShellState,
    stdout: &mut dyn Write,
) -> Option<Result<Flow>> {
    if name != T::name() {
        return None;
    }
    Some(match T::from_args(&[name], args) {
        Ok(cmd) => cmd.run(state, stdout),
        Err(EarlyExit { output, .. }) => writeln!(stdout, "{}", output.trim_end())
            .map(|_| Flow::Continue)
            .map_err(Into::into),
    })
}

#[derive(FromArgs)]
/// Kill every tracked background process, then leave the shell with code 0.
pub struct Exit {}

impl Builtin for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn run(self, state: &mut ShellState, _stdout: &mut dyn Write) -> Result<Flow> {
        state.jobs.kill_all();
        Ok(Flow::Exit)
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
/// Without a target, changes to the directory named by the HOME environment variable.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory.
    pub target: Option<String>,
}

impl Builtin for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn run(self, _state: &mut ShellState, _stdout: &mut dyn Write) -> Result<Flow> {
        let target = match &self.target {
            Some(t) if !t.is_empty() => PathBuf::from(t),
            _ => {
                let home = env::var("HOME").context("cd: no target and HOME not set")?;
                PathBuf::from(home)
            }
        };
        env::set_current_dir(&target)
            .with_context(|| format!("cd: can't chdir to {}", target.display()))?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Print the current working directory to standard output.
pub struct Pwd {}

impl Builtin for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn run(self, _state: &mut ShellState, stdout: &mut dyn Write) -> Result<Flow> {
        let cwd = env::current_dir().context("pwd: can't read current directory")?;
        writeln!(stdout, "{}", cwd.to_string_lossy())?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Print how the last foreground command ended: its exit value, or the signal
/// that terminated it.
pub struct Status {}

impl Builtin for Status {
    fn name() -> &'static str {
        "status"
    }

    fn run(self, state: &mut ShellState, stdout: &mut dyn Write) -> Result<Flow> {
        writeln!(stdout, "{}", state.last_status)?;
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::LastStatus;
    use std::fs;

    fn run_builtin(
        name: &str,
        args: &[&str],
        state: &mut ShellState,
    ) -> (Option<Result<Flow>>, String) {
        let mut out = Vec::new();
        let res = dispatch(name, args, state, &mut out);
        (res, String::from_utf8(out).expect("utf8 output"))
    }

    #[test]
    fn unknown_name_is_not_a_builtin() {
        let mut state = ShellState::new();
        let (res, out) = run_builtin("ls", &[], &mut state);
        assert!(res.is_none());
        assert!(out.is_empty());
    }

    #[test]
    fn status_reports_initial_exit_zero() {
        let mut state = ShellState::new();
        let (res, out) = run_builtin("status", &[], &mut state);
        assert!(matches!(res, Some(Ok(Flow::Continue))));
        assert_eq!(out, "exit value 0\n");
    }

    #[test]
    fn status_reports_signal_termination() {
        let mut state = ShellState::new();
        state.last_status = LastStatus::Signaled(2);
        let (_, out) = run_builtin("status", &[], &mut state);
        assert_eq!(out, "terminated by signal 2\n");
    }

    #[test]
    fn status_never_changes_state() {
        let mut state = ShellState::new();
        state.last_status = LastStatus::Exited(42);
        let _ = run_builtin("status", &[], &mut state);
        assert_eq!(state.last_status, LastStatus::Exited(42));
    }

    #[test]
    fn exit_requests_loop_termination() {
        let mut state = ShellState::new();
        let (res, _) = run_builtin("exit", &[], &mut state);
        assert!(matches!(res, Some(Ok(Flow::Exit))));
        assert!(state.jobs.is_empty());
    }

    #[test]
    fn cd_changes_directory_and_back() {
        let before = env::current_dir().expect("cwd");
        let tmp = env::temp_dir().join(format!("jobsh_cd_test_{}", std::process::id()));
        fs::create_dir_all(&tmp).expect("mkdir");

        let mut state = ShellState::new();
        let target = tmp.to_string_lossy().into_owned();
        let (res, _) = run_builtin("cd", &[&target], &mut state);
        assert!(matches!(res, Some(Ok(Flow::Continue))));

        let now = env::current_dir().expect("cwd");
        assert_eq!(fs::canonicalize(now).ok(), fs::canonicalize(&tmp).ok());

        env::set_current_dir(&before).expect("restore cwd");
        let _ = fs::remove_dir_all(tmp);
    }

    #[test]
    fn cd_failure_is_reported_not_fatal() {
        let mut state = ShellState::new();
        let (res, _) = run_builtin("cd", &["/definitely/not/a/real/dir"], &mut state);
        assert!(matches!(res, Some(Err(_))));
    }

    #[test]
    fn bad_arguments_print_usage_and_continue() {
        let mut state = ShellState::new();
        state.last_status = LastStatus::Exited(5);
        let (res, out) = run_builtin("cd", &["a", "b"], &mut state);
        assert!(matches!(res, Some(Ok(Flow::Continue))));
        assert!(!out.is_empty());
        // Built-in argument errors leave the last status untouched.
        assert_eq!(state.last_status, LastStatus::Exited(5));
    }
}

//! A small line-oriented command interpreter with job control.
//!
//! This crate reads one command per line, expands the `$$` sentinel to the
//! interpreter's own pid, and runs the command either in-process (the
//! built-ins `exit`, `cd`, `pwd`, `status`) or as a spawned child process
//! with `<`/`>` redirection, a trailing `&` for background execution, and
//! signal-aware termination reporting. It is intentionally small and easy to
//! read, suitable for experiments with process management and signal
//! dispositions.
//!
//! The main entry point is [`Interpreter`]; [`SignalFlags::install`] wires up
//! the interpreter-side signal handlers. The public modules expose the
//! individual stages: [`lexer`] (pid expansion and tokenization), [`parser`]
//! (redirection and background shaping), [`state`] (last status and the
//! bounded job table), and [`signals`] (disposition management at the
//! interpreter and child boundaries).

mod builtin;
mod interpreter;
pub mod lexer;
pub mod parser;
pub mod signals;
pub mod state;

pub use interpreter::{Flow, Interpreter, PROMPT};
pub use signals::SignalFlags;

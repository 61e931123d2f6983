//! Shaping a token list into an executable [`Command`].
//!
//! This stage extracts the redirection markers (`<` path, `>` path) and the
//! trailing background marker (`&`) from the token list, leaving an argument
//! vector that can be handed to process creation as-is.

use std::path::PathBuf;

/// Where the standard streams of an external command should come from and go.
///
/// `None` means "inherit the interpreter's corresponding stream". Input and
/// output redirection are independent; either, both, or neither may be set.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RedirectSpec {
    /// File to open read-only and bind to the child's standard input.
    pub input: Option<PathBuf>,
    /// File to open write/create/truncate and bind to the child's standard output.
    pub output: Option<PathBuf>,
}

/// A fully shaped command, ready for classification and dispatch.
#[derive(Debug, PartialEq, Eq)]
pub struct Command {
    /// Argument vector; index 0 is the command name. Contains no honored
    /// redirection tokens and no trailing `&`.
    pub argv: Vec<String>,
    /// Redirection targets stripped out of the token list.
    pub redirect: RedirectSpec,
    /// True when a trailing `&` requested background execution.
    pub background: bool,
}

impl Command {
    /// Command name, when the argument vector is non-empty.
    pub fn name(&self) -> Option<&str> {
        self.argv.first().map(|s| s.as_str())
    }
}

/// Errors that can occur while shaping a command.
#[derive(Debug, PartialEq, Eq)]
pub enum ParseError {
    /// A redirection marker appeared with no following token to name its target.
    MissingRedirectTarget(char),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::MissingRedirectTarget(marker) => {
                write!(f, "redirection marker '{marker}' has no target file")
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Shape a token list into a [`Command`].
///
/// A single left-to-right scan honors the *first* occurrence of each
/// redirection marker: the following token becomes the target path and both
/// tokens are excised from the argument vector. A repeated marker is left in
/// place and passed through as a literal argument. A trailing `&` sets the
/// background flag and is stripped; a non-trailing `&` is a literal argument.
pub fn parse_command(tokens: Vec<String>) -> Result<Command, ParseError> {
    let mut tokens = tokens;

    let background = tokens.last().is_some_and(|t| t == "&");
    if background {
        tokens.pop();
    }

    let mut argv = Vec::with_capacity(tokens.len());
    let mut redirect = RedirectSpec::default();

    let mut iter = tokens.into_iter();
    while let Some(token) = iter.next() {
        let slot = match token.as_str() {
            "<" if redirect.input.is_none() => &mut redirect.input,
            ">" if redirect.output.is_none() => &mut redirect.output,
            _ => {
                argv.push(token);
                continue;
            }
        };
        match iter.next() {
            Some(target) => *slot = Some(PathBuf::from(target)),
            None => {
                let marker = token.chars().next().unwrap_or('?');
                return Err(ParseError::MissingRedirectTarget(marker));
            }
        }
    }

    Ok(Command {
        argv,
        redirect,
        background,
    })
}

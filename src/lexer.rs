//! Lexical analysis for the shell: pid expansion and whitespace tokenization.
//!
//! The command language is deliberately flat — no quoting, no globbing, no
//! variable expansion other than the `$$` sentinel. A raw line is first
//! rewritten with every `$$` replaced by the interpreter's pid, then split on
//! runs of whitespace.

/// Longest accepted input line, in bytes. Anything longer is reported as a
/// recoverable input error and the line is dropped.
pub const MAX_LINE_LEN: usize = 2048;

/// Errors that can occur while turning a raw line into tokens.
#[derive(Debug, PartialEq, Eq)]
pub enum LineError {
    /// The input line exceeds [`MAX_LINE_LEN`].
    TooLong(usize),
}

impl std::fmt::Display for LineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LineError::TooLong(len) => {
                write!(f, "input line too long ({len} bytes, max {MAX_LINE_LEN})")
            }
        }
    }
}

impl std::error::Error for LineError {}

/// Replace every non-overlapping occurrence of `$$` with the decimal form of
/// `pid`, scanning left to right.
///
/// Left-to-right non-overlapping replacement means a `$$` formed immediately
/// after a substitution is itself expanded: `$$$$` becomes `<pid><pid>`, while
/// `$$$` becomes `<pid>$`.
pub fn expand_pid(line: &str, pid: u32) -> String {
    line.replace("$$", &pid.to_string())
}

/// Turn a raw input line into an ordered list of tokens.
///
/// Expansion happens before tokenization, so a `$$` adjacent to whitespace
/// still expands. An empty line, an all-whitespace line, or a line whose first
/// token starts with `#` yields an empty token list — a no-op cycle.
pub fn split_words(line: &str, pid: u32) -> Result<Vec<String>, LineError> {
    if line.len() > MAX_LINE_LEN {
        return Err(LineError::TooLong(line.len()));
    }

    let expanded = expand_pid(line, pid);
    let words: Vec<String> = expanded
        .split_whitespace()
        .map(|w| w.to_string())
        .collect();

    match words.first() {
        None => Ok(Vec::new()),
        Some(first) if first.starts_with('#') => Ok(Vec::new()),
        Some(_) => Ok(words),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_every_occurrence() {
        assert_eq!(expand_pid("echo $$ and $$", 4567), "echo 4567 and 4567");
    }

    #[test]
    fn expansion_leaves_other_text_untouched() {
        assert_eq!(expand_pid("echo hello$$", 4567), "echo hello4567");
        assert_eq!(expand_pid("no sentinel here", 4567), "no sentinel here");
    }

    #[test]
    fn adjacent_sentinels_all_expand() {
        // Four dollars form two sentinels, three form one plus a literal.
        assert_eq!(expand_pid("$$$$", 7), "77");
        assert_eq!(expand_pid("$$$", 7), "7$");
    }

    #[test]
    fn expansion_applies_before_tokenization() {
        let words = split_words("echo hello$$ $$world", 4567).unwrap();
        assert_eq!(words, vec!["echo", "hello4567", "4567world"]);
    }

    #[test]
    fn splits_on_whitespace_runs() {
        let words = split_words("  ls \t -la   /tmp ", 1).unwrap();
        assert_eq!(words, vec!["ls", "-la", "/tmp"]);
    }

    #[test]
    fn blank_and_comment_lines_yield_nothing() {
        assert!(split_words("", 1).unwrap().is_empty());
        assert!(split_words("   \t ", 1).unwrap().is_empty());
        assert!(split_words("#comment", 1).unwrap().is_empty());
        assert!(split_words("   # spaced comment", 1).unwrap().is_empty());
    }

    #[test]
    fn hash_inside_a_word_is_not_a_comment() {
        let words = split_words("echo a#b", 1).unwrap();
        assert_eq!(words, vec!["echo", "a#b"]);
    }

    #[test]
    fn oversized_line_is_a_recoverable_error() {
        let long = "x".repeat(MAX_LINE_LEN + 1);
        assert_eq!(
            split_words(&long, 1),
            Err(LineError::TooLong(MAX_LINE_LEN + 1))
        );
    }
}

//! Structural checks on an expanded word sequence.
//!
//! Validation is pure: it looks only at the words and never touches a file or
//! process. The rules are checked in a fixed order (input redirection, output
//! redirection, pipes, built-ins) and the first violation rejects the line.

use crate::command::is_builtin_name;
use crate::lexer::{INPUT_REDIRECT, OUTPUT_REDIRECT, PIPE, is_operator};
use std::fmt;

/// Errors that reject a line before anything is executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    /// `<` misplaced, repeated, missing its file, or without a command.
    InvalidInputRedirection,
    /// `>`/`> >` misplaced, repeated, missing its file, or followed by more words.
    InvalidOutputRedirection,
    /// `|` first, last, or followed by an operator.
    InvalidPipe,
    /// A built-in appears in a line that redirects or pipes.
    BuiltinRedirection(String),
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxError::InvalidInputRedirection => write!(f, "invalid input redirection"),
            SyntaxError::InvalidOutputRedirection => write!(f, "invalid output redirection"),
            SyntaxError::InvalidPipe => write!(f, "invalid pipe"),
            SyntaxError::BuiltinRedirection(name) => {
                write!(f, "{}: I/O redirection not permitted for builtin commands", name)
            }
        }
    }
}

impl std::error::Error for SyntaxError {}

/// Confirm that `words` denote a legal pipeline.
pub fn validate<S: AsRef<str>>(words: &[S]) -> Result<(), SyntaxError> {
    let words: Vec<&str> = words.iter().map(AsRef::as_ref).collect();
    check_input_redirection(&words)?;
    check_output_redirection(&words)?;
    check_pipes(&words)?;
    check_builtins(&words)
}

fn is_filename(word: Option<&&str>) -> bool {
    matches!(word, Some(w) if !is_operator(w))
}

/// `< file cmd ...`: only as the first word, once, with a real filename and a command.
fn check_input_redirection(words: &[&str]) -> Result<(), SyntaxError> {
    let mut found = false;
    for (i, word) in words.iter().enumerate() {
        if *word != INPUT_REDIRECT {
            continue;
        }
        if i != 0 || found || !is_filename(words.get(i + 1)) {
            return Err(SyntaxError::InvalidInputRedirection);
        }
        found = true;
    }
    if found && !is_filename(words.get(2)) {
        return Err(SyntaxError::InvalidInputRedirection);
    }
    Ok(())
}

/// `cmd ... > file` or `cmd ... > > file`, and nothing after the file.
fn check_output_redirection(words: &[&str]) -> Result<(), SyntaxError> {
    let Some(first) = words.iter().position(|w| *w == OUTPUT_REDIRECT) else {
        return Ok(());
    };
    if first == 0 {
        return Err(SyntaxError::InvalidOutputRedirection);
    }

    let target = if words.get(first + 1) == Some(&OUTPUT_REDIRECT) {
        first + 2
    } else {
        first + 1
    };
    if !is_filename(words.get(target)) || target + 1 != words.len() {
        return Err(SyntaxError::InvalidOutputRedirection);
    }
    Ok(())
}

fn check_pipes(words: &[&str]) -> Result<(), SyntaxError> {
    for (i, word) in words.iter().enumerate() {
        if *word == PIPE && (i == 0 || !is_filename(words.get(i + 1))) {
            return Err(SyntaxError::InvalidPipe);
        }
    }
    Ok(())
}

/// Built-ins run inside the shell, so they cannot take part in redirection or pipes.
fn check_builtins(words: &[&str]) -> Result<(), SyntaxError> {
    let (mut i, mut redirected) = if words.first() == Some(&INPUT_REDIRECT) {
        (2, true)
    } else {
        (0, false)
    };

    let mut leaders = Vec::new();
    leaders.extend(words.get(i).copied());
    while i < words.len() {
        match words[i] {
            PIPE => {
                redirected = true;
                leaders.extend(words.get(i + 1).copied());
            }
            OUTPUT_REDIRECT => {
                redirected = true;
                break;
            }
            _ => {}
        }
        i += 1;
    }

    if !redirected {
        return Ok(());
    }
    match leaders.into_iter().find(|name| is_builtin_name(name)) {
        Some(name) => Err(SyntaxError::BuiltinRedirection(name.to_string())),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::split_into_words;

    fn check(line: &str) -> Result<(), SyntaxError> {
        validate(&split_into_words(line))
    }

    #[test]
    fn plain_commands_and_pipes_are_valid() {
        assert_eq!(validate(&["cmd", "|", "cmd2"]), Ok(()));
        assert_eq!(check("ls -l"), Ok(()));
        assert_eq!(check("cat a | sort | uniq -c"), Ok(()));
        assert_eq!(check("< in sort | head > out"), Ok(()));
        assert_eq!(check("echo hi >> log"), Ok(()));
        assert_eq!(check(""), Ok(()));
    }

    #[test]
    fn input_redirection_rules() {
        assert_eq!(check("sort < in"), Err(SyntaxError::InvalidInputRedirection));
        assert_eq!(check("< in"), Err(SyntaxError::InvalidInputRedirection));
        assert_eq!(check("<"), Err(SyntaxError::InvalidInputRedirection));
        assert_eq!(check("< | cat"), Err(SyntaxError::InvalidInputRedirection));
        assert_eq!(check("< > cat"), Err(SyntaxError::InvalidInputRedirection));
        assert_eq!(check("< a < b cat"), Err(SyntaxError::InvalidInputRedirection));
        assert_eq!(check("< in > out"), Err(SyntaxError::InvalidInputRedirection));
        assert_eq!(check("< in | cat"), Err(SyntaxError::InvalidInputRedirection));
    }

    #[test]
    fn output_redirection_rules() {
        assert_eq!(check("> out"), Err(SyntaxError::InvalidOutputRedirection));
        assert_eq!(check("echo >"), Err(SyntaxError::InvalidOutputRedirection));
        assert_eq!(check("echo > >"), Err(SyntaxError::InvalidOutputRedirection));
        assert_eq!(check("echo > > > f"), Err(SyntaxError::InvalidOutputRedirection));
        assert_eq!(check("echo > a > b"), Err(SyntaxError::InvalidOutputRedirection));
        assert_eq!(check("echo > a b"), Err(SyntaxError::InvalidOutputRedirection));
        assert_eq!(check("echo > | cat"), Err(SyntaxError::InvalidOutputRedirection));
    }

    #[test]
    fn pipe_after_output_redirection_is_rejected() {
        assert!(validate(&["cmd", ">", "out", "|", "cmd2"]).is_err());
    }

    #[test]
    fn pipe_rules() {
        assert_eq!(validate(&["|", "cmd"]), Err(SyntaxError::InvalidPipe));
        assert_eq!(check("cmd |"), Err(SyntaxError::InvalidPipe));
        assert_eq!(check("cmd | | cmd2"), Err(SyntaxError::InvalidPipe));
    }

    #[test]
    fn builtins_cannot_be_redirected_or_piped() {
        assert_eq!(
            validate(&["cd", "|", "cmd"]),
            Err(SyntaxError::BuiltinRedirection("cd".to_string()))
        );
        assert_eq!(
            check("ls | pwd"),
            Err(SyntaxError::BuiltinRedirection("pwd".to_string()))
        );
        assert_eq!(
            check("history > out"),
            Err(SyntaxError::BuiltinRedirection("history".to_string()))
        );
        assert_eq!(
            check("< in cd"),
            Err(SyntaxError::BuiltinRedirection("cd".to_string()))
        );
        assert_eq!(
            check("!3 | cat"),
            Err(SyntaxError::BuiltinRedirection("!".to_string()))
        );
    }

    #[test]
    fn builtins_alone_are_fine() {
        assert_eq!(check("cd /tmp"), Ok(()));
        assert_eq!(check("history 5"), Ok(()));
        assert_eq!(check("!"), Ok(()));
        assert_eq!(check("echo cd | cat"), Ok(()));
    }

    #[test]
    fn diagnostics_match_shell_messages() {
        assert_eq!(SyntaxError::InvalidInputRedirection.to_string(), "invalid input redirection");
        assert_eq!(SyntaxError::InvalidOutputRedirection.to_string(), "invalid output redirection");
        assert_eq!(SyntaxError::InvalidPipe.to_string(), "invalid pipe");
        assert_eq!(
            SyntaxError::BuiltinRedirection("cd".into()).to_string(),
            "cd: I/O redirection not permitted for builtin commands"
        );
    }
}

use crate::env::SearchPath;
use crate::external::find_command_path;
use std::path::{Path, PathBuf};

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

/// What a stage's leading word refers to, resolved once while building a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    /// `cd`
    ChangeDir,
    /// `pwd`
    PrintWorkingDir,
    /// `history`
    History,
    /// `!`, re-runs a line from the history log.
    Bang,
    /// A program on disk, by its resolved path.
    External(PathBuf),
}

impl CommandKind {
    /// Look `name` up among the built-ins only.
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "cd" => Some(CommandKind::ChangeDir),
            "pwd" => Some(CommandKind::PrintWorkingDir),
            "history" => Some(CommandKind::History),
            "!" => Some(CommandKind::Bang),
            _ => None,
        }
    }

    /// Resolve `name` to a built-in or to an executable file.
    ///
    /// Built-ins take precedence over programs of the same name.
    pub fn resolve(name: &str, search_path: &SearchPath) -> Option<Self> {
        Self::builtin(name).or_else(|| {
            find_command_path(search_path, name)
                .map(|path| CommandKind::External(path.into_owned()))
        })
    }

    pub fn is_builtin(&self) -> bool {
        !matches!(self, CommandKind::External(_))
    }

    /// Path of the program image, `None` for built-ins.
    pub fn executable(&self) -> Option<&Path> {
        match self {
            CommandKind::External(path) => Some(path),
            _ => None,
        }
    }
}

/// Returns true when `name` is reserved for a built-in command.
pub fn is_builtin_name(name: &str) -> bool {
    CommandKind::builtin(name).is_some()
}

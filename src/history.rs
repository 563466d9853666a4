//! The on-disk history log: one executed line per text line.

use crate::env::Environment;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// File name of the history log inside `$HOME`.
pub const HISTORY_FILE_NAME: &str = ".pipesh_history";

/// Number of entries `history` prints without an argument.
pub const DEFAULT_HISTORY_SHOWN: usize = 10;

/// Handle to a history log file. A missing file behaves as an empty log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    path: PathBuf,
}

impl History {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The log in the user's home directory, if `HOME` is set.
    pub fn in_home(env: &Environment) -> Option<Self> {
        env.get_var("HOME")
            .map(|home| Self::new(Path::new(home).join(HISTORY_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `words` joined by single spaces as one line.
    pub fn append<S: AsRef<str>>(&self, words: &[S]) -> io::Result<()> {
        let line = words
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<&str>>()
            .join(" ");
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)
    }

    /// All recorded lines, oldest first.
    pub fn lines(&self) -> io::Result<Vec<String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(content.lines().map(str::to_string).collect()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// Number of recorded lines.
    pub fn count(&self) -> io::Result<usize> {
        Ok(self.lines()?.len())
    }

    /// The line at 0-based position `n`.
    pub fn nth_line(&self, n: usize) -> io::Result<Option<String>> {
        Ok(self.lines()?.into_iter().nth(n))
    }

    /// The most recent line.
    pub fn last_line(&self) -> io::Result<Option<String>> {
        Ok(self.lines()?.pop())
    }

    /// The last `n` lines together with their 0-based positions.
    pub fn tail(&self, n: usize) -> io::Result<Vec<(usize, String)>> {
        let lines = self.lines()?;
        let skip = lines.len().saturating_sub(n);
        Ok(lines.into_iter().enumerate().skip(skip).collect())
    }
}

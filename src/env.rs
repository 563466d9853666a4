use std::collections::HashMap;
use std::env as stdenv;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Search path used when `PATH` is not set.
pub const DEFAULT_PATH: &str = "/bin:/usr/bin";

/// User-level view of the process environment handed to every pipeline execution.
///
/// The environment contains:
/// - `vars`: the variables that executed programs will see, and nothing else.
/// - `current_dir`: the working directory programs are started in.
///
/// Pipelines receive it by shared reference; only built-ins such as `cd` mutate it.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Key-value store of environment variables (e.g., PATH, HOME).
    pub vars: HashMap<String, String>,
    /// The current working directory for command execution.
    pub current_dir: PathBuf,
}

impl Environment {
    /// Capture the current process state into a new `Environment` instance.
    ///
    /// Variables whose name or value is not valid unicode are skipped.
    pub fn new() -> Self {
        let vars = stdenv::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self { vars, current_dir }
    }

    /// Get the value of an environment variable.
    pub fn get_var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// The search path derived from this environment's `PATH`.
    pub fn search_path(&self) -> SearchPath {
        SearchPath::from_env_value(self.get_var("PATH").map(OsStr::new))
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

/// Ordered list of directories consulted when resolving a bare program name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
}

impl SearchPath {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    /// Build a search path from a `PATH`-style value, falling back to [`DEFAULT_PATH`].
    /// Empty components are dropped.
    pub fn from_env_value(value: Option<&OsStr>) -> Self {
        let value = value.unwrap_or_else(|| OsStr::new(DEFAULT_PATH));
        let dirs = stdenv::split_paths(value)
            .filter(|dir| !dir.as_os_str().is_empty())
            .collect();
        Self { dirs }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.dirs.iter().map(PathBuf::as_path)
    }
}

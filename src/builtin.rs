use crate::command::ExitCode;
use crate::env::Environment;
use crate::executor::os_message;
use crate::history::{DEFAULT_HISTORY_SHOWN, History};
use anyhow::{Result, anyhow};
use argh::{EarlyExit, FromArgs};
use std::env;
use std::io::Write;
use std::path::PathBuf;

/// What a built-in may touch while it runs.
pub(crate) struct BuiltinContext<'a> {
    pub env: &'a mut Environment,
    pub history: Option<&'a History>,
}

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process without spawning a child process. Errors carry the full diagnostic line.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "pwd" or "cd".
    fn name() -> &'static str;

    /// Executes the command, writing its regular output to `stdout`.
    fn execute(self, ctx: &mut BuiltinContext<'_>, stdout: &mut dyn Write) -> Result<ExitCode>;

    /// Parse `argv` (including the command name) and run the command.
    fn run(argv: &[String], ctx: &mut BuiltinContext<'_>, stdout: &mut dyn Write) -> Result<ExitCode> {
        parse_args::<Self>(argv)?.execute(ctx, stdout)
    }
}

/// Parse a built-in's arguments; `--help` output and argh errors become the error text.
pub(crate) fn parse_args<T: FromArgs>(argv: &[String]) -> Result<T> {
    let (name, args) = argv
        .split_first()
        .ok_or_else(|| anyhow!("empty builtin invocation"))?;
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    T::from_args(&[name.as_str()], &args).map_err(|EarlyExit { output, .. }| {
        anyhow!("{}: {}", name, output.trim_end())
    })
}

/// Parse a non-negative count argument the way `history` and `!` expect it.
fn parse_count(name: &str, word: &str) -> Result<usize> {
    word.parse::<usize>()
        .map_err(|_| anyhow!("{}: {}: numeric argument required", name, word))
}

#[derive(FromArgs)]
/// Print the current working directory.
pub struct Pwd {
    #[argh(positional, greedy)]
    /// not accepted; present to report a usage error.
    pub extra: Vec<String>,
}

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn execute(self, ctx: &mut BuiltinContext<'_>, stdout: &mut dyn Write) -> Result<ExitCode> {
        if !self.extra.is_empty() {
            return Err(anyhow!("pwd: too many arguments"));
        }
        let cwd = env::current_dir().map_err(|e| anyhow!("getcwd: {}", e))?;
        ctx.env.current_dir = cwd.clone();
        writeln!(stdout, "current directory is '{}'", cwd.display())?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
/// If no target is provided, changes to the directory specified by the HOME environment variable.
pub struct Cd {
    #[argh(positional, greedy)]
    /// directory to switch to; absolute or relative to the current directory. Defaults to $HOME when omitted.
    pub targets: Vec<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, ctx: &mut BuiltinContext<'_>, _stdout: &mut dyn Write) -> Result<ExitCode> {
        let target = match self.targets.as_slice() {
            [] => match ctx.env.get_var("HOME") {
                Some(home) => PathBuf::from(home),
                None => return Err(anyhow!("cd: HOME not set")),
            },
            [target] => PathBuf::from(target),
            _ => return Err(anyhow!("cd: too many arguments")),
        };

        env::set_current_dir(&target)
            .map_err(|e| anyhow!("cd: {}: {}", target.display(), os_message(&e)))?;
        ctx.env.current_dir = env::current_dir().unwrap_or(target);
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Print the most recent lines of the history log with their positions.
pub struct HistoryCmd {
    #[argh(positional, greedy)]
    /// how many lines to show (default 10)
    pub count: Vec<String>,
}

impl BuiltinCommand for HistoryCmd {
    fn name() -> &'static str {
        "history"
    }

    fn execute(self, ctx: &mut BuiltinContext<'_>, stdout: &mut dyn Write) -> Result<ExitCode> {
        let shown = match self.count.as_slice() {
            [] => DEFAULT_HISTORY_SHOWN,
            [n] => parse_count(Self::name(), n)?,
            _ => return Err(anyhow!("history: too many arguments")),
        };
        let Some(history) = ctx.history else {
            return Ok(0);
        };
        for (index, line) in history.tail(shown)? {
            writeln!(stdout, "{}: {}", index, line)?;
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Re-run a line from the history log (the last one by default).
pub struct Bang {
    #[argh(positional, greedy)]
    /// position of the line to re-run
    pub index: Vec<String>,
}

impl Bang {
    pub const NAME: &'static str = "!";

    /// Look up the line to re-run.
    pub fn recall(self, history: Option<&History>) -> Result<String> {
        let index = match self.index.as_slice() {
            [] => None,
            [n] => Some(parse_count(Self::NAME, n)?),
            _ => return Err(anyhow!("!: too many arguments")),
        };
        let invalid = || anyhow!("!: invalid history reference");
        let history = history.ok_or_else(invalid)?;
        let line = match index {
            None => history.last_line()?,
            Some(n) => history.nth_line(n)?,
        };
        line.ok_or_else(invalid)
    }
}

use crate::builtin::{Bang, BuiltinCommand, BuiltinContext, Cd, HistoryCmd, Pwd, parse_args};
use crate::command::{CommandKind, ExitCode};
use crate::config::Settings;
use crate::env::{Environment, SearchPath};
use crate::executor;
use crate::expand::expand_words;
use crate::history::History;
use crate::lexer::split_into_words;
use crate::parser::{self, Pipeline};
use crate::validate::validate;
use log::{debug, warn};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, BufRead, IsTerminal, Write};

const PROMPT: &str = "pipesh& ";

/// What the read loop should do after a line has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit(ExitCode),
}

/// A line-at-a-time shell.
///
/// Every line goes through the same steps: it is split into words, `exit` is
/// handled, patterns are expanded, the words are validated and built into a
/// [`Pipeline`], and the pipeline either runs a built-in in-process or is handed
/// to the executor. Finally the line is recorded in the history log.
///
/// Example
/// ```no_run
/// use pipesh::{Flow, Interpreter, Settings};
/// let mut sh = Interpreter::new(&Settings::default());
/// assert_eq!(sh.run_line("true"), Flow::Continue);
/// assert_eq!(sh.run_line("exit 3"), Flow::Exit(3));
/// ```
pub struct Interpreter {
    env: Environment,
    search_path: SearchPath,
    history: Option<History>,
}

impl Interpreter {
    /// Capture the process environment and pick the history log `settings` ask for.
    pub fn new(settings: &Settings) -> Self {
        let env = Environment::new();
        let history = if settings.no_history {
            None
        } else {
            settings
                .history_file
                .clone()
                .map(History::new)
                .or_else(|| History::in_home(&env))
        };
        Self::with_parts(env, history)
    }

    /// Build an interpreter from an explicit environment and history log.
    ///
    /// The search path is taken from the environment's `PATH` once, here.
    pub fn with_parts(env: Environment, history: Option<History>) -> Self {
        let search_path = env.search_path();
        debug!("search path: {:?}", search_path);
        Self {
            env,
            search_path,
            history,
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn history(&self) -> Option<&History> {
        self.history.as_ref()
    }

    /// Run one line against the process's stdout and stderr.
    pub fn run_line(&mut self, line: &str) -> Flow {
        let stdout = io::stdout();
        let stderr = io::stderr();
        self.run_line_with_output(line, &mut stdout.lock(), &mut stderr.lock())
    }

    /// Run one line; the shell's own output goes to `out` and `err`.
    ///
    /// Programs started by the line inherit the process's real stdout and stderr.
    pub fn run_line_with_output(
        &mut self,
        line: &str,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> Flow {
        match self.run_words(line, out, err, false) {
            Ok(flow) => flow,
            Err(e) => {
                warn!("cannot write shell output: {}", e);
                Flow::Continue
            }
        }
    }

    fn run_words(
        &mut self,
        line: &str,
        out: &mut dyn Write,
        err: &mut dyn Write,
        recalled: bool,
    ) -> io::Result<Flow> {
        let words = split_into_words(line);
        let Some(program) = words.first() else {
            return Ok(Flow::Continue);
        };

        if program == "exit" {
            self.record(&words);
            return match exit_status(&words) {
                Ok(code) => Ok(Flow::Exit(code)),
                Err(message) => {
                    writeln!(err, "{}", message)?;
                    Ok(Flow::Continue)
                }
            };
        }

        let expanded = expand_words(&words);
        if let Err(e) = validate(&expanded) {
            writeln!(err, "{}", e)?;
            return Ok(Flow::Continue);
        }

        let pipeline = match parser::build(&expanded, &self.search_path) {
            Ok(pipeline) => pipeline,
            Err(e) => {
                writeln!(err, "{}", e)?;
                self.record(&words);
                return Ok(Flow::Continue);
            }
        };

        let Some(stage) = pipeline.as_builtin() else {
            return self.execute(&pipeline, &words, out, err);
        };
        let mut ctx = BuiltinContext {
            env: &mut self.env,
            history: self.history.as_ref(),
        };
        let (result, always_recorded) = match stage.command {
            CommandKind::ChangeDir => (Cd::run(&stage.argv, &mut ctx, out), false),
            CommandKind::PrintWorkingDir => (Pwd::run(&stage.argv, &mut ctx, out), false),
            CommandKind::History => (HistoryCmd::run(&stage.argv, &mut ctx, out), true),
            CommandKind::Bang => return self.recall(&stage.argv, out, err, recalled),
            CommandKind::External(_) => return self.execute(&pipeline, &words, out, err),
        };

        if let Err(e) = &result {
            writeln!(err, "{}", e)?;
        }
        if result.is_ok() || always_recorded {
            self.record(&words);
        }
        Ok(Flow::Continue)
    }

    fn execute(
        &mut self,
        pipeline: &Pipeline,
        words: &[String],
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> io::Result<Flow> {
        out.flush()?;
        let outcome = executor::execute(pipeline, &self.env);
        debug!("pipeline finished: {:?}", outcome);
        outcome.report(out, err)?;
        self.record(words);
        Ok(Flow::Continue)
    }

    /// `! [n]`: echo a line from the history log, then run it as if typed.
    fn recall(
        &mut self,
        argv: &[String],
        out: &mut dyn Write,
        err: &mut dyn Write,
        recalled: bool,
    ) -> io::Result<Flow> {
        if recalled {
            writeln!(err, "!: invalid history reference")?;
            return Ok(Flow::Continue);
        }
        let line = match parse_args::<Bang>(argv).and_then(|bang| bang.recall(self.history.as_ref())) {
            Ok(line) => line,
            Err(e) => {
                writeln!(err, "{}", e)?;
                return Ok(Flow::Continue);
            }
        };
        writeln!(out, "{}", line)?;
        self.run_words(&line, out, err, true)
    }

    fn record(&self, words: &[String]) {
        let Some(history) = &self.history else {
            return;
        };
        if let Err(e) = history.append(words) {
            warn!("cannot append to {}: {}", history.path().display(), e);
        }
    }

    /// Run lines from `input` until it ends or a line asks to exit.
    pub fn run_script<R: BufRead>(
        &mut self,
        input: R,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> anyhow::Result<ExitCode> {
        for line in input.lines() {
            if let Flow::Exit(code) = self.run_line_with_output(&line?, out, err) {
                return Ok(code);
            }
        }
        Ok(0)
    }

    /// Read-Eval-Print Loop: line editing on a terminal, plain lines otherwise.
    ///
    /// Returns the status the shell should exit with.
    pub fn repl(&mut self) -> anyhow::Result<ExitCode> {
        if io::stdin().is_terminal() && io::stdout().is_terminal() {
            self.interactive()
        } else {
            self.run_script(io::stdin().lock(), &mut io::stdout(), &mut io::stderr())
        }
    }

    fn interactive(&mut self) -> anyhow::Result<ExitCode> {
        let mut rl = DefaultEditor::new()?;
        loop {
            match rl.readline(PROMPT) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str())?;
                    }
                    if let Flow::Exit(code) = self.run_line(&line) {
                        return Ok(code);
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => return Ok(0),
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// `exit [status]`: the status to leave with, or the diagnostic line.
fn exit_status(words: &[String]) -> Result<ExitCode, String> {
    match words {
        [_] => Ok(0),
        [_, status] => status
            .parse::<ExitCode>()
            .map_err(|_| format!("exit: {}: numeric argument required", status)),
        _ => Err("exit: too many arguments".to_string()),
    }
}

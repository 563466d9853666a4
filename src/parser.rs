use crate::command::CommandKind;
use crate::env::SearchPath;
use crate::lexer::{INPUT_REDIRECT, OUTPUT_REDIRECT, PIPE};
use log::debug;
use std::fmt;
use std::path::PathBuf;

/// Kind of redirection
///
/// Defines the specific operation mode for an I/O redirection (`<`, `>`, `> >`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectKind {
    /// Input redirection (`<`): the first stage reads standard input from a file.
    Input,
    /// Output redirection (`>`): the last stage writes to a file, **overwriting** it.
    OutputTruncate,
    /// Output redirection with append (`> >`): the last stage **appends** to a file.
    OutputAppend,
}

/// A binding of the pipeline's stdin or stdout to a named file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirection {
    pub kind: RedirectKind,
    pub target: PathBuf,
}

/// One process of a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    /// The leading word as typed; also `argv[0]`.
    pub program_name: String,
    /// Full argument vector, `argv[0] == program_name`.
    pub argv: Vec<String>,
    /// What the leading word resolved to.
    pub command: CommandKind,
}

/// An ordered chain of stages connected by pipes.
///
/// Input redirection binds to the first stage, output redirection to the last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    pub stages: Vec<Stage>,
    pub input: Option<Redirection>,
    pub output: Option<Redirection>,
}

impl Pipeline {
    /// Number of pipes needed to connect the stages.
    pub fn pipe_count(&self) -> usize {
        self.stages.len().saturating_sub(1)
    }

    /// The single built-in this pipeline consists of, if any.
    pub fn as_builtin(&self) -> Option<&Stage> {
        match self.stages.as_slice() {
            [stage] if stage.command.is_builtin() => Some(stage),
            _ => None,
        }
    }

    /// The stages' argument vectors flattened back into words, without operators
    /// or redirection targets.
    pub fn argv_words(&self) -> Vec<&str> {
        self.stages
            .iter()
            .flat_map(|stage| stage.argv.iter().map(String::as_str))
            .collect()
    }
}

/// Errors that can occur while building a pipeline from validated words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// A stage's program could not be resolved to a built-in or an executable file.
    ProgramNotFound(String),
    /// A stage (or the whole line) has no words, or a redirection lacks its target.
    EmptyCommand,
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::ProgramNotFound(name) => write!(f, "{}: command not found", name),
            BuildError::EmptyCommand => write!(f, "invalid pipe"),
        }
    }
}

impl std::error::Error for BuildError {}

struct PipelineBuilder<'w> {
    words: &'w [String],
    pos: usize,
    search_path: &'w SearchPath,
}

impl<'w> PipelineBuilder<'w> {
    fn peek(&self) -> Option<&'w str> {
        self.words.get(self.pos).map(String::as_str)
    }

    fn consume(&mut self) -> Option<&'w str> {
        let word = self.peek();
        if word.is_some() {
            self.pos += 1;
        }
        word
    }

    /// Parse a pipeline: ('<' file)? stage ('|' stage)* ('>' '>'? file)?
    fn build(mut self) -> Result<Pipeline, BuildError> {
        let input = if self.peek() == Some(INPUT_REDIRECT) {
            self.consume();
            Some(self.parse_target(RedirectKind::Input)?)
        } else {
            None
        };

        let mut stages = vec![self.parse_stage()?];
        let mut output = None;
        while let Some(word) = self.consume() {
            match word {
                PIPE => stages.push(self.parse_stage()?),
                OUTPUT_REDIRECT => {
                    let kind = if self.peek() == Some(OUTPUT_REDIRECT) {
                        self.consume();
                        RedirectKind::OutputAppend
                    } else {
                        RedirectKind::OutputTruncate
                    };
                    output = Some(self.parse_target(kind)?);
                    break;
                }
                _ => unreachable!("parse_stage stops only at an operator"),
            }
        }

        Ok(Pipeline {
            stages,
            input,
            output,
        })
    }

    fn parse_target(&mut self, kind: RedirectKind) -> Result<Redirection, BuildError> {
        let target = self.consume().ok_or(BuildError::EmptyCommand)?;
        Ok(Redirection {
            kind,
            target: PathBuf::from(target),
        })
    }

    /// Collect words up to the next `|` or `>` and resolve the leading one.
    fn parse_stage(&mut self) -> Result<Stage, BuildError> {
        let mut argv = Vec::new();
        while let Some(word) = self.peek() {
            if word == PIPE || word == OUTPUT_REDIRECT {
                break;
            }
            argv.push(word.to_string());
            self.pos += 1;
        }

        let program_name = argv.first().cloned().ok_or(BuildError::EmptyCommand)?;
        let command = CommandKind::resolve(&program_name, self.search_path)
            .ok_or_else(|| BuildError::ProgramNotFound(program_name.clone()))?;
        debug!("stage {:?} resolved to {:?}", program_name, command);

        Ok(Stage {
            program_name,
            argv,
            command,
        })
    }
}

/// Build a [`Pipeline`] from an already validated word sequence.
///
/// Every stage is resolved before anything else happens; the first stage whose
/// program cannot be found aborts the build.
pub fn build(words: &[String], search_path: &SearchPath) -> Result<Pipeline, BuildError> {
    let builder = PipelineBuilder {
        words,
        pos: 0,
        search_path,
    };
    builder.build()
}

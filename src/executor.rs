//! Spawning and supervising the processes of a [`Pipeline`].
//!
//! For `N` stages the executor allocates `N - 1` pipes, starts every stage with
//! its standard streams bound to the right pipe end or redirection file, and then
//! reaps every child. All descriptors are opened close-on-exec, so a child only
//! ever holds the two ends it was handed as stdin and stdout.
//!
//! A pipeline's status is the status of its last stage.

use crate::command::ExitCode;
use crate::env::Environment;
use crate::parser::{Pipeline, RedirectKind, Redirection, Stage};
use log::{debug, trace, warn};
use std::fs::{File, OpenOptions};
use std::io::{self, PipeReader, PipeWriter, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};

/// Result of executing one pipeline.
#[derive(Debug)]
pub enum ExecutionOutcome {
    /// Every stage ran; `code` is the last stage's exit status.
    Completed { program: PathBuf, code: ExitCode },
    /// The OS refused to start a stage. Earlier stages were reaped.
    SpawnFailed {
        stage: usize,
        program: PathBuf,
        error: io::Error,
    },
    /// A stage's program disappeared between resolution and spawning,
    /// or the stage has no program image at all.
    ProgramNotFound { stage: usize, name: String },
    /// A redirection file could not be opened. Nothing was spawned.
    IoError { path: PathBuf, error: io::Error },
    /// Pipe allocation failed. Nothing was spawned.
    PipeFailed(io::Error),
    /// Reaping a stage failed; the remaining stages were still reaped.
    WaitFailed {
        stage: usize,
        program: PathBuf,
        error: io::Error,
    },
}

impl ExecutionOutcome {
    /// The last stage's status, if the pipeline completed.
    pub fn exit_code(&self) -> Option<ExitCode> {
        match self {
            ExecutionOutcome::Completed { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Write the one-line report: the exit status to `stdout`, any failure to `stderr`.
    pub fn report(&self, stdout: &mut dyn Write, stderr: &mut dyn Write) -> io::Result<()> {
        match self {
            ExecutionOutcome::Completed { program, code } => {
                writeln!(stdout, "{} exit status = {}", program.display(), code)
            }
            ExecutionOutcome::SpawnFailed { program, error, .. } => {
                writeln!(stderr, "{}: {}", program.display(), os_message(error))
            }
            ExecutionOutcome::ProgramNotFound { name, .. } => {
                writeln!(stderr, "{}: command not found", name)
            }
            ExecutionOutcome::IoError { path, error } => {
                writeln!(stderr, "{}: {}", path.display(), os_message(error))
            }
            ExecutionOutcome::PipeFailed(error) => writeln!(stderr, "pipe: {}", os_message(error)),
            ExecutionOutcome::WaitFailed { program, error, .. } => {
                writeln!(stderr, "{}: wait failed: {}", program.display(), os_message(error))
            }
        }
    }
}

/// The text of `error` as the C library would print it, without the
/// ` (os error N)` suffix `io::Error` appends.
pub fn os_message(error: &io::Error) -> String {
    let text = error.to_string();
    match error.raw_os_error() {
        Some(code) => match text.strip_suffix(&format!(" (os error {})", code)) {
            Some(message) => message.to_string(),
            None => text,
        },
        None => text,
    }
}

/// One OS pipe; each end is taken exactly once, when it is handed to a child.
#[derive(Debug)]
struct Pipe {
    reader: Option<PipeReader>,
    writer: Option<PipeWriter>,
}

impl Pipe {
    fn new() -> io::Result<Self> {
        let (reader, writer) = io::pipe()?;
        Ok(Pipe {
            reader: Some(reader),
            writer: Some(writer),
        })
    }
}

struct Spawned {
    stage: usize,
    program: PathBuf,
    child: Child,
}

/// Execution state of one pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Built,
    PipesAllocated,
    Spawning(usize),
    AllSpawned,
    Waiting,
    Reported,
}

/// The pipes and children of one pipeline execution.
///
/// Dropping the graph closes every descriptor it still owns and reaps every
/// child it started, whichever path led there.
struct ProcessGraph {
    phase: Phase,
    pipes: Vec<Pipe>,
    input: Option<File>,
    output: Option<File>,
    children: Vec<Spawned>,
}

impl ProcessGraph {
    fn new(input: Option<File>, output: Option<File>) -> Self {
        ProcessGraph {
            phase: Phase::Built,
            pipes: Vec::new(),
            input,
            output,
            children: Vec::new(),
        }
    }

    fn enter(&mut self, phase: Phase) {
        trace!("pipeline {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    fn allocate_pipes(&mut self, count: usize) -> io::Result<()> {
        self.pipes.reserve_exact(count);
        for _ in 0..count {
            self.pipes.push(Pipe::new()?);
        }
        self.enter(Phase::PipesAllocated);
        Ok(())
    }

    /// Standard input of stage `i`: previous pipe, input file, or inherited.
    fn stdin_for(&mut self, i: usize) -> Stdio {
        if i > 0 {
            return self.pipes[i - 1].reader.take().map_or_else(Stdio::null, Stdio::from);
        }
        self.input.take().map_or_else(Stdio::inherit, Stdio::from)
    }

    /// Standard output of stage `i`: next pipe, output file, or inherited.
    fn stdout_for(&mut self, i: usize) -> Stdio {
        if i < self.pipes.len() {
            return self.pipes[i].writer.take().map_or_else(Stdio::null, Stdio::from);
        }
        self.output.take().map_or_else(Stdio::inherit, Stdio::from)
    }

    fn spawn(&mut self, i: usize, stage: &Stage, env: &Environment) -> Result<(), ExecutionOutcome> {
        self.enter(Phase::Spawning(i));
        let stdin = self.stdin_for(i);
        let stdout = self.stdout_for(i);

        let Some(program) = stage.command.executable() else {
            return Err(ExecutionOutcome::ProgramNotFound {
                stage: i,
                name: stage.program_name.clone(),
            });
        };

        let mut command = Command::new(program);
        command
            .arg0(&stage.program_name)
            .args(stage.argv.iter().skip(1))
            .env_clear()
            .envs(&env.vars)
            .current_dir(&env.current_dir)
            .stdin(stdin)
            .stdout(stdout);

        // The command owns the parent's copies of this stage's pipe ends and files;
        // they are closed when it goes out of scope.
        match command.spawn() {
            Ok(child) => {
                debug!("stage {} spawned {} as pid {}", i, program.display(), child.id());
                self.children.push(Spawned {
                    stage: i,
                    program: program.to_path_buf(),
                    child,
                });
                Ok(())
            }
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                Err(ExecutionOutcome::ProgramNotFound {
                    stage: i,
                    name: stage.program_name.clone(),
                })
            }
            Err(error) => Err(ExecutionOutcome::SpawnFailed {
                stage: i,
                program: program.to_path_buf(),
                error,
            }),
        }
    }

    /// Close the parent's remaining descriptors so every reader sees EOF.
    fn release_descriptors(&mut self) {
        self.pipes.clear();
        self.input = None;
        self.output = None;
    }

    /// Wait for every child. Returns the last stage's status, or the first wait failure.
    fn wait_all(&mut self, last_stage: usize) -> Result<Option<ExitStatus>, ExecutionOutcome> {
        self.release_descriptors();
        self.enter(Phase::Waiting);

        let mut last_status = None;
        let mut failure = None;
        for mut spawned in self.children.drain(..) {
            match spawned.child.wait() {
                Ok(status) => {
                    debug!("stage {} exited with {}", spawned.stage, status);
                    if spawned.stage == last_stage {
                        last_status = Some(status);
                    }
                }
                Err(error) => {
                    warn!("failed to reap stage {}: {}", spawned.stage, error);
                    failure.get_or_insert(ExecutionOutcome::WaitFailed {
                        stage: spawned.stage,
                        program: spawned.program,
                        error,
                    });
                }
            }
        }
        match failure {
            Some(outcome) => Err(outcome),
            None => Ok(last_status),
        }
    }
}

impl Drop for ProcessGraph {
    fn drop(&mut self) {
        if self.children.is_empty() && self.pipes.is_empty() {
            return;
        }
        self.release_descriptors();
        for mut spawned in self.children.drain(..) {
            if let Err(error) = spawned.child.wait() {
                warn!("failed to reap stage {}: {}", spawned.stage, error);
            }
        }
    }
}

fn open_redirection(redirection: &Redirection) -> Result<File, ExecutionOutcome> {
    let mut options = OpenOptions::new();
    match redirection.kind {
        RedirectKind::Input => options.read(true),
        RedirectKind::OutputTruncate => options.write(true).create(true).truncate(true).mode(0o644),
        RedirectKind::OutputAppend => options.append(true).create(true).mode(0o644),
    };
    options
        .open(&redirection.target)
        .map_err(|error| ExecutionOutcome::IoError {
            path: redirection.target.clone(),
            error,
        })
}

/// Run every stage of `pipeline` and wait for all of them.
///
/// Redirection files are opened before any process starts. If a stage cannot be
/// spawned, the stages already running are still reaped before reporting.
pub fn execute(pipeline: &Pipeline, env: &Environment) -> ExecutionOutcome {
    let stage_count = pipeline.stages.len();
    if stage_count == 0 {
        return ExecutionOutcome::ProgramNotFound {
            stage: 0,
            name: String::new(),
        };
    }

    let input = match pipeline.input.as_ref().map(open_redirection).transpose() {
        Ok(file) => file,
        Err(outcome) => return outcome,
    };
    let output = match pipeline.output.as_ref().map(open_redirection).transpose() {
        Ok(file) => file,
        Err(outcome) => return outcome,
    };

    let mut graph = ProcessGraph::new(input, output);
    if let Err(error) = graph.allocate_pipes(pipeline.pipe_count()) {
        return ExecutionOutcome::PipeFailed(error);
    }

    for (i, stage) in pipeline.stages.iter().enumerate() {
        if let Err(outcome) = graph.spawn(i, stage, env) {
            warn!("stage {} of {} failed to start", i, stage_count);
            if let Err(wait_failure) = graph.wait_all(stage_count - 1) {
                warn!("{:?}", wait_failure);
            }
            graph.enter(Phase::Reported);
            return outcome;
        }
    }
    graph.enter(Phase::AllSpawned);

    let outcome = match graph.wait_all(stage_count - 1) {
        Ok(Some(status)) => ExecutionOutcome::Completed {
            program: last_program(pipeline),
            code: status_code(status),
        },
        Ok(None) => ExecutionOutcome::ProgramNotFound {
            stage: stage_count - 1,
            name: pipeline.stages[stage_count - 1].program_name.clone(),
        },
        Err(outcome) => outcome,
    };
    graph.enter(Phase::Reported);
    outcome
}

fn last_program(pipeline: &Pipeline) -> PathBuf {
    pipeline
        .stages
        .last()
        .and_then(|stage| stage.command.executable())
        .map(Path::to_path_buf)
        .unwrap_or_default()
}

/// Exit code of a finished child; signal deaths map to `128 + signal`.
pub fn status_code(status: ExitStatus) -> ExitCode {
    match status.code() {
        Some(code) => code,
        None => terminated_by_signal(status),
    }
}

fn terminated_by_signal(exit_status: ExitStatus) -> ExitCode {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = exit_status.signal() {
        128 + signal
    } else if exit_status.core_dumped() {
        255
    } else {
        -1
    }
}

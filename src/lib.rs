//! A small line-oriented shell built around a pipeline engine.
//!
//! A line is split into words by [`lexer`], checked by [`validate`](mod@validate), turned into a
//! [`parser::Pipeline`] whose stages are resolved against a [`env::SearchPath`],
//! and run by [`executor`], which wires the stages together with pipes, applies
//! file redirections and waits for every process before reporting the exit status
//! of the last one.
//!
//! [`Interpreter`] drives that engine line by line and adds the shell around it:
//! pattern expansion, the `cd`, `pwd`, `history` and `!` built-ins, `exit`, and an
//! on-disk history log.

mod builtin;
pub mod command;
pub mod config;
pub mod env;
pub mod executor;
mod expand;
mod external;
pub mod history;
mod interpreter;
pub mod lexer;
pub mod logging;
pub mod parser;
pub mod validate;

pub use config::Settings;
pub use executor::{ExecutionOutcome, execute};
pub use expand::expand_words;
pub use external::find_command_path;
pub use interpreter::{Flow, Interpreter};
pub use parser::{BuildError, Pipeline, build};
pub use validate::{SyntaxError, validate};

//! Log backend selection.
//!
//! The engine logs through the `log` facade. Nothing is installed by default so
//! that stdout and stderr carry only the shell's own output.

use crate::config::Settings;
use anyhow::{Context, Result};
use simplelog::{
    ColorChoice, CombinedLogger, Config, LevelFilter, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};
use std::fs::OpenOptions;

/// Install the loggers requested by `settings`.
pub fn init(settings: &Settings) -> Result<()> {
    let loggers = loggers(settings)?;
    if loggers.is_empty() {
        return Ok(());
    }
    CombinedLogger::init(loggers).context("failed to install logger")
}

fn loggers(settings: &Settings) -> Result<Vec<Box<dyn SharedLogger>>> {
    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    if settings.verbose {
        loggers.push(TermLogger::new(
            LevelFilter::Debug,
            Config::default(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ));
    }
    if let Some(path) = &settings.log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("cannot open log file {}", path.display()))?;
        loggers.push(WriteLogger::new(LevelFilter::Trace, Config::default(), file));
    }
    Ok(loggers)
}

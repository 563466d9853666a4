use argh::FromArgs;
use std::path::PathBuf;

#[derive(FromArgs, Debug, Default, Clone, PartialEq, Eq)]
/// A line-oriented shell that runs pipelines of external programs.
pub struct Settings {
    #[argh(switch, short = 'v')]
    /// log engine activity to stderr
    pub verbose: bool,

    #[argh(option)]
    /// write the engine log to this file instead of stderr
    pub log_file: Option<PathBuf>,

    #[argh(option)]
    /// history log to use instead of $HOME/.pipesh_history
    pub history_file: Option<PathBuf>,

    #[argh(switch)]
    /// neither record nor recall history
    pub no_history: bool,
}

impl Settings {
    /// Whether any log backend should be installed.
    pub fn wants_logging(&self) -> bool {
        self.verbose || self.log_file.is_some()
    }
}

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Bridge Mill heaters onto the local MQTT bus.
#[derive(Parser, Debug)]
#[command(name = "millheat", version, about)]
pub struct Cli {
    /// Working directory holding config.toml and data/state.json
    #[arg(short = 'c', long = "work-dir", env = "MILLHEAT_WORK_DIR", global = true)]
    pub work_dir: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Poll the Mill cloud and publish to MQTT until interrupted (default)
    Run,
    /// Authorize against the Mill API and store the session
    Login,
}

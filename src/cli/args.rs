//! CLI argument definitions using clap

use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::CONFIG_ENV_VAR;

#[derive(Parser, Debug, Clone)]
#[command(name = "pronote-updater", version, about = "Check for and install PRONOTE Desktop updates", long_about = None)]
pub struct Args {
    /// Config file (defaults to <config dir>/pronote-desktop/updater.toml)
    #[arg(long = "config", value_name = "PATH", env = CONFIG_ENV_VAR, global = true)]
    pub config: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log as JSON lines on stderr
    #[arg(long = "log-json", action = ArgAction::SetTrue, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Compare the running version with the latest release
    Check(ReportArgs),

    /// Download, verify and install the latest release
    Install(ReportArgs),

    /// Relaunch the desktop client
    Restart(RestartArgs),
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct ReportArgs {
    /// Print the raw JSON reply
    #[arg(long = "json", action = ArgAction::SetTrue)]
    pub json: bool,

    /// Exit with status 2 when already on the latest release
    #[arg(long = "fail-if-current", action = ArgAction::SetTrue)]
    pub fail_if_current: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RestartArgs {
    /// Client executable to launch
    #[arg(long = "exe", value_name = "PATH")]
    pub exe: PathBuf,

    /// Print the raw JSON reply
    #[arg(long = "json", action = ArgAction::SetTrue)]
    pub json: bool,

    /// Arguments passed to the client
    #[arg(last = true, value_name = "ARGS")]
    pub args: Vec<String>,
}

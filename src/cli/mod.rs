//! Command-line host for the updater

pub mod args;
pub mod commands;

pub use args::{Args, Command, ReportArgs, RestartArgs};
pub use commands::run;

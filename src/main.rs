use clap::Parser;

use pronote_updater::cli::{self, Args};
use pronote_updater::logging::{init_logging, LogOptions};
use pronote_updater::status::ExitStatus;

/// Entry point - parses arguments, sets up logging and calls cli::run()
///
/// Returns ExitStatus directly, which implements std::process::Termination.
fn main() -> ExitStatus {
    let args = Args::parse();

    init_logging(LogOptions {
        verbosity: args.verbose,
        json: args.log_json,
    });

    match cli::run(args) {
        Ok(status) => status,
        Err(e) => {
            eprintln!("pronote-updater: {:#}", e);
            ExitStatus::Error
        }
    }
}

//! Relaunching the host process after an install

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;
use tracing::{error, info};

/// Delay between spawning the new process and exiting this one, so the
/// restart reply still reaches the UI
pub const EXIT_GRACE: Duration = Duration::from_millis(300);

/// Starts a fresh copy of the host and ends the current one
pub trait Relauncher: Send + Sync {
    fn relaunch(&self);
}

/// Spawns the host executable, then exits this process after [`EXIT_GRACE`]
#[derive(Debug, Clone, Default)]
pub struct ProcessRelauncher {
    /// `None` re-executes the current binary with its own arguments
    program: Option<PathBuf>,
    args: Vec<OsString>,
}

impl ProcessRelauncher {
    /// Re-execute the running binary
    pub fn current() -> Self {
        Self::default()
    }

    /// Launch a different host executable
    pub fn new<I, S>(program: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            program: Some(program.into()),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Arguments are taken as `OsString`s so non-UTF-8 ones survive
    fn target(&self) -> std::io::Result<(PathBuf, Vec<OsString>)> {
        match &self.program {
            Some(program) => Ok((program.clone(), self.args.clone())),
            None => Ok((std::env::current_exe()?, std::env::args_os().skip(1).collect())),
        }
    }
}

impl Relauncher for ProcessRelauncher {
    fn relaunch(&self) {
        match self.target() {
            Ok((exe, args)) => match Command::new(&exe).args(&args).spawn() {
                Ok(child) => info!(exe = %exe.display(), pid = child.id(), "Relaunched host process"),
                Err(e) => error!(exe = %exe.display(), error = %e, "Failed to relaunch host process"),
            },
            Err(e) => error!(error = %e, "Cannot locate current executable for relaunch"),
        }

        std::thread::spawn(|| {
            std::thread::sleep(EXIT_GRACE);
            std::process::exit(0);
        });
    }
}

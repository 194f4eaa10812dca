//! Exit status codes for the CLI
//!
//! - 0: the command succeeded
//! - 1: any failure (network, integrity, installer, config)
//! - 2: no update available and `--fail-if-current` was given

use std::process::{ExitCode, Termination};

use crate::updater::{CheckResponse, InstallResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitStatus {
    Success = 0,
    Error = 1,
    /// The client already runs the latest release
    UpToDate = 2,
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status as u8)
    }
}

impl Termination for ExitStatus {
    fn report(self) -> ExitCode {
        ExitCode::from(self as u8)
    }
}

impl ExitStatus {
    /// Exit status for a `check` reply
    pub fn from_check(response: &CheckResponse, fail_if_current: bool) -> Self {
        match (&response.info, response.ok) {
            (_, false) => ExitStatus::Error,
            (Some(info), true) if fail_if_current && !info.has_update => ExitStatus::UpToDate,
            _ => ExitStatus::Success,
        }
    }

    /// Exit status for an `install` reply; `up_to_date` is set when the
    /// install failed only because no newer release exists
    pub fn from_install(response: &InstallResponse, up_to_date: bool, fail_if_current: bool) -> Self {
        if response.ok {
            ExitStatus::Success
        } else if up_to_date && fail_if_current {
            ExitStatus::UpToDate
        } else {
            ExitStatus::Error
        }
    }
}

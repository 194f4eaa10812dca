//! Privileged installation of downloaded packages
//!
//! Each escalation strategy wraps the same non-interactive package manager
//! command. Strategies are tried in order and the first success wins.

pub mod runner;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::errors::{Result, UpdateError};
use crate::strings::{shell_escape, tail_chars};
pub use runner::{CommandLine, CommandOutput, CommandRunner, CommandStatus, SystemCommandRunner, OUTPUT_LIMIT};

/// A way of running the install command with root privileges
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscalationStrategy {
    /// Reported back as the install method
    pub method: &'static str,
    pub program: &'static str,
    pub args: &'static [&'static str],
}

/// polkit one-shot elevation, then passwordless sudo
pub const DEFAULT_STRATEGIES: [EscalationStrategy; 2] = [
    EscalationStrategy {
        method: "pkexec",
        program: "pkexec",
        args: &[],
    },
    EscalationStrategy {
        method: "sudo",
        program: "sudo",
        args: &["-n"],
    },
];

/// Which strategy installed the package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub method: String,
}

/// Installs `.deb` packages through the system package manager
#[derive(Clone)]
pub struct Installer {
    runner: Arc<dyn CommandRunner>,
    strategies: Vec<EscalationStrategy>,
    timeout: Duration,
}

impl std::fmt::Debug for Installer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Installer")
            .field("strategies", &self.strategies)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Installer {
    pub fn new(runner: Arc<dyn CommandRunner>, timeout: Duration) -> Self {
        Self {
            runner,
            strategies: DEFAULT_STRATEGIES.to_vec(),
            timeout,
        }
    }

    pub fn system(timeout: Duration) -> Self {
        Self::new(Arc::new(SystemCommandRunner), timeout)
    }

    pub fn with_strategies(mut self, strategies: Vec<EscalationStrategy>) -> Self {
        self.strategies = strategies;
        self
    }

    /// Install the package at `path`, trying each strategy in order
    pub async fn install_package(&self, path: &Path) -> Result<InstallReport> {
        let path = std::path::absolute(path)?;
        let path_str = path.to_string_lossy().into_owned();

        let mut last_reason = String::from("no installation method configured");
        let mut last_output = String::new();

        for strategy in &self.strategies {
            let command = escalated_command(strategy, &path_str);
            info!(method = strategy.method, command = %command, "Attempting package installation");

            let result = self.runner.run(&command, self.timeout).await;
            if result.success() {
                info!(method = strategy.method, "Package installed");
                return Ok(InstallReport {
                    method: strategy.method.to_string(),
                });
            }

            last_reason = format!("{}: {}", strategy.method, describe_status(&result.status));
            warn!(method = strategy.method, reason = %last_reason, "Installation attempt failed");
            last_output = result.output;
        }

        Err(UpdateError::InstallFailed {
            reason: last_reason,
            output: tail_chars(last_output.trim(), OUTPUT_LIMIT).to_string(),
            manual_command: manual_install_command(&path_str),
        })
    }
}

/// Package manager invocation installing a local file without prompts
fn install_args(path: &str) -> Vec<String> {
    ["env", "DEBIAN_FRONTEND=noninteractive", "apt-get", "install", "-y", path]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn escalated_command(strategy: &EscalationStrategy, path: &str) -> CommandLine {
    let mut args: Vec<String> = strategy.args.iter().map(|s| s.to_string()).collect();
    args.extend(install_args(path));
    CommandLine::new(strategy.program, args)
}

/// Command a user can paste into a terminal to install by hand
pub fn manual_install_command(path: &str) -> String {
    format!("sudo apt-get install -y {}", shell_escape(path))
}

fn describe_status(status: &CommandStatus) -> String {
    match status {
        CommandStatus::Success => "succeeded".to_string(),
        CommandStatus::Failed(Some(code)) => format!("exited with status {}", code),
        CommandStatus::Failed(None) => "terminated by signal".to_string(),
        CommandStatus::SpawnFailed(e) => format!("could not start ({})", e),
        CommandStatus::TimedOut(after) => format!("timed out after {}s", after.as_secs()),
    }
}

//! Subprocess execution for install commands

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use crate::strings::tail_chars;

/// Longest combined stdout+stderr kept per attempt, in characters
pub const OUTPUT_LIMIT: usize = 20_000;

/// A fully specified command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl std::fmt::Display for CommandLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// How a command ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandStatus {
    /// Exited with status 0
    Success,
    /// Exited non-zero, or was killed by a signal (`None`)
    Failed(Option<i32>),
    /// Could not be started at all
    SpawnFailed(String),
    /// Killed after running past the timeout
    TimedOut(Duration),
}

/// Status plus the tail of everything the command printed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub status: CommandStatus,
    pub output: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == CommandStatus::Success
    }
}

/// Runs install commands; swapped out in tests
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &CommandLine, timeout: Duration) -> CommandOutput;
}

/// Runs commands as real child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, command: &CommandLine, timeout: Duration) -> CommandOutput {
        debug!(command = %command, "Spawning installer command");

        let child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(e) => {
                return CommandOutput {
                    status: CommandStatus::SpawnFailed(format!("{}: {}", command.program, e)),
                    output: String::new(),
                }
            }
        };

        // On timeout the future is dropped, and kill_on_drop reaps the child
        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
                combined.push_str(&String::from_utf8_lossy(&output.stderr));
                let status = if output.status.success() {
                    CommandStatus::Success
                } else {
                    CommandStatus::Failed(output.status.code())
                };
                CommandOutput {
                    status,
                    output: tail_chars(&combined, OUTPUT_LIMIT).to_string(),
                }
            }
            Ok(Err(e)) => CommandOutput {
                status: CommandStatus::SpawnFailed(format!("{}: {}", command.program, e)),
                output: String::new(),
            },
            Err(_) => CommandOutput {
                status: CommandStatus::TimedOut(timeout),
                output: String::new(),
            },
        }
    }
}

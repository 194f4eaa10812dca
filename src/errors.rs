//! Error types for the update pipeline

use thiserror::Error;

/// Every failure the update pipeline can produce.
#[derive(Error, Debug)]
pub enum UpdateError {
    #[error("Invalid update URL: {0}")]
    InvalidUrl(String),

    #[error("Insecure update URL (HTTPS required): {0}")]
    InsecureScheme(String),

    #[error("Update host not allowed: {0}")]
    HostNotAllowed(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status} from update server: {body}")]
    Http { status: u16, body: String },

    #[error("Malformed response from update server: {0}")]
    MalformedResponse(String),

    #[error("Too many redirects (max {0})")]
    TooManyRedirects(usize),

    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("Unsupported package digest: {0}")]
    UnsupportedDigest(String),

    #[error("No update available (current version {current})")]
    NoUpdateAvailable { current: String },

    #[error("No compatible package found for this system")]
    NoCompatibleAsset,

    #[error("{0}")]
    UnsupportedPlatform(String),

    #[error("An update installation is already in progress")]
    AlreadyInProgress,

    #[error("Installation failed: {reason}\n{output}\nRun manually: {manual_command}")]
    InstallFailed {
        reason: String,
        output: String,
        manual_command: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl UpdateError {
    /// Copy-pasteable command that finishes the job by hand, when one exists
    pub fn manual_command(&self) -> Option<&str> {
        match self {
            UpdateError::InstallFailed { manual_command, .. } => Some(manual_command),
            _ => None,
        }
    }
}

/// Transport failures, including bodies cut off mid-stream. Invalid JSON
/// is reported through `serde_json` instead.
impl From<reqwest::Error> for UpdateError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpdateError::Network(format!("request timed out: {}", err))
        } else {
            UpdateError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for UpdateError {
    fn from(err: serde_json::Error) -> Self {
        UpdateError::MalformedResponse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, UpdateError>;

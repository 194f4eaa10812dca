//! Config file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::UpdateError;
use crate::guard::{UrlGuard, DEFAULT_ALLOWED_HOSTS};

/// Environment variable pointing at an alternative config file
pub const CONFIG_ENV_VAR: &str = "PRONOTE_UPDATER_CONFIG";

/// Release repository the desktop client is published from
pub const DEFAULT_RELEASE_API_BASE: &str = "https://api.github.com/repos/Tarzzan/pronote-desktop";

/// Updater configuration (TOML, every key optional)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpdaterConfig {
    /// Base of the release API; `/releases/latest` is appended
    pub release_api_base: String,

    /// Hosts the pipeline may contact, matched exactly
    pub allowed_hosts: Vec<String>,

    /// Version of the running client; defaults to this crate's version
    pub current_version: Option<String>,

    /// Timeout for release metadata requests
    pub metadata_timeout_secs: u64,

    /// Timeout for package downloads
    pub download_timeout_secs: u64,

    /// Timeout for each privileged install attempt
    pub installer_timeout_secs: u64,

    /// Where packages are downloaded; defaults to a directory under the system temp dir
    pub download_dir: Option<PathBuf>,

    /// Maximum length of release notes handed to the UI
    pub notes_limit: usize,

    /// Accept http:// for loopback hosts on the allow-list (local mock servers)
    pub allow_insecure_loopback: bool,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            release_api_base: DEFAULT_RELEASE_API_BASE.to_string(),
            allowed_hosts: DEFAULT_ALLOWED_HOSTS.iter().map(|h| h.to_string()).collect(),
            current_version: None,
            metadata_timeout_secs: 20,
            download_timeout_secs: 600,
            installer_timeout_secs: 900,
            download_dir: None,
            notes_limit: 10_000,
            allow_insecure_loopback: false,
        }
    }
}

impl UpdaterConfig {
    /// Load from `$PRONOTE_UPDATER_CONFIG`, or the default config file.
    ///
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self, UpdateError> {
        let path = std::env::var_os(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_config_file);
        Self::load_from(&path)
    }

    /// Load from an explicit path; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self, UpdateError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No updater config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| UpdateError::Config(format!("Failed to read {}: {}", path.display(), e)))?;

        Self::from_toml(&content)
            .map_err(|e| UpdateError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse a TOML document
    pub fn from_toml(content: &str) -> Result<Self, UpdateError> {
        toml::from_str(content).map_err(|e| UpdateError::Config(format!("Invalid config TOML: {}", e)))
    }

    /// Get the default config file path
    pub fn default_config_file() -> PathBuf {
        dirs::config_dir()
            .map(|p| p.join("pronote-desktop"))
            .unwrap_or_else(|| PathBuf::from(".pronote-desktop"))
            .join("updater.toml")
    }

    pub fn current_version(&self) -> String {
        self.current_version
            .clone()
            .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string())
    }

    pub fn metadata_timeout(&self) -> Duration {
        Duration::from_secs(self.metadata_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    pub fn installer_timeout(&self) -> Duration {
        Duration::from_secs(self.installer_timeout_secs)
    }

    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("pronote-desktop-updates"))
    }

    pub fn url_guard(&self) -> UrlGuard {
        UrlGuard::new(self.allowed_hosts.iter().cloned())
            .allow_insecure_loopback(self.allow_insecure_loopback)
    }
}

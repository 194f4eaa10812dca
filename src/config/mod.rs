//! Updater configuration

#[allow(clippy::module_inception)]
mod config;

pub use config::{UpdaterConfig, CONFIG_ENV_VAR, DEFAULT_RELEASE_API_BASE};

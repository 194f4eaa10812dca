//! Self-update pipeline for the PRONOTE Desktop client
//!
//! Checks the release feed, picks the package for the running platform,
//! downloads and verifies it, then installs it through a privileged
//! package-manager call. Every network hop is held to an HTTPS host
//! allow-list.
//!
//! # Module Organization
//!
//! - [`updater`] - Orchestration and the UI-boundary replies (Updater)
//! - [`release`] - Release feed model, fetch and asset selection
//! - [`downloads`] - Streaming package download and digest checks
//! - [`installer`] - Privileged package installation
//! - [`guard`] - URL allow-list enforcement
//! - [`progress`] - Progress events and subscriptions
//! - [`errors`] - Error types (UpdateError, Result)

pub mod cli;
pub mod client;
pub mod config;
pub mod downloads;
pub mod errors;
pub mod guard;
pub mod installer;
pub mod logging;
pub mod platform;
pub mod progress;
pub mod release;
pub mod status;
pub mod strings;
pub mod updater;
pub mod version;

pub use errors::{Result, UpdateError};
pub use updater::Updater;

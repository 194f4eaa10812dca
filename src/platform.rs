//! Host platform detection
//!
//! The OS and CPU architecture decide whether the update pipeline can
//! install anything at all, and which package it picks.

use tracing::info;

/// Operating system family and CPU architecture of the running process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPlatform {
    pub os: String,
    pub arch: String,
}

impl HostPlatform {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// Detect the current platform from the compile target
    pub fn detect() -> Self {
        let platform = Self::new(std::env::consts::OS, std::env::consts::ARCH);
        info!(os = %platform.os, arch = %platform.arch, "Platform detected");
        platform
    }
}

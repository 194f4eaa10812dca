//! Update orchestration
//!
//! [`Updater`] sequences the pipeline (fetch, select, download, verify,
//! install) and publishes progress while it runs. The `*_for_updates` /
//! `*_update` / `*_app` methods are the UI boundary: they never fail, they
//! fold errors into their JSON reply.

pub mod guard;
pub mod responses;
pub mod restart;

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::client::HttpClient;
use crate::config::UpdaterConfig;
use crate::downloads::downloader::remove_partial;
use crate::downloads::{ExpectedDigest, PackageDownloader};
use crate::errors::{Result, UpdateError};
use crate::installer::Installer;
use crate::platform::HostPlatform;
use crate::progress::{ProgressChannel, ProgressEvent, Stage, Subscription};
use crate::release::{build_update_info, fetch_latest_release, UpdateContext, UpdateInfo};

pub use guard::InstallGuard;
pub use responses::{CheckResponse, InstallOutcome, InstallResponse, RestartResponse};
pub use restart::{ProcessRelauncher, Relauncher};

/// File name used when an asset name sanitizes to nothing
const FALLBACK_PACKAGE_NAME: &str = "update.deb";

/// Drives checks, installs and restarts for the running client
pub struct Updater {
    config: UpdaterConfig,
    current_version: String,
    client: HttpClient,
    downloader: PackageDownloader,
    installer: Installer,
    platform: HostPlatform,
    relauncher: Arc<dyn Relauncher>,
    progress: ProgressChannel,
    install_in_flight: Arc<AtomicBool>,
}

impl std::fmt::Debug for Updater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Updater")
            .field("current_version", &self.current_version)
            .field("platform", &self.platform)
            .field("release_api_base", &self.config.release_api_base)
            .finish()
    }
}

impl Updater {
    /// Build an updater for the running host: detected platform, real
    /// installer commands and process relaunch.
    pub fn new(config: UpdaterConfig) -> Result<Self> {
        let current_version = config.current_version();
        let client = HttpClient::new(config.url_guard(), &current_version)?;
        let downloader = PackageDownloader::new(client.clone(), config.download_timeout());
        let installer = Installer::system(config.installer_timeout());

        Ok(Self {
            config,
            current_version,
            client,
            downloader,
            installer,
            platform: HostPlatform::detect(),
            relauncher: Arc::new(ProcessRelauncher::current()),
            progress: ProgressChannel::new(),
            install_in_flight: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn with_platform(mut self, platform: HostPlatform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_installer(mut self, installer: Installer) -> Self {
        self.installer = installer;
        self
    }

    pub fn with_relauncher(mut self, relauncher: Arc<dyn Relauncher>) -> Self {
        self.relauncher = relauncher;
        self
    }

    pub fn config(&self) -> &UpdaterConfig {
        &self.config
    }

    pub fn current_version(&self) -> &str {
        &self.current_version
    }

    pub fn platform(&self) -> &HostPlatform {
        &self.platform
    }

    pub fn progress(&self) -> &ProgressChannel {
        &self.progress
    }

    fn context(&self) -> UpdateContext {
        UpdateContext {
            current_version: self.current_version.clone(),
            os: self.platform.os.clone(),
            arch: self.platform.arch.clone(),
            notes_limit: self.config.notes_limit,
        }
    }

    fn emit(&self, stage: Stage, message: impl Into<String>) {
        self.progress.emit(ProgressEvent::new(stage, message));
    }

    /// Fetch the latest release and compare it with the running version.
    ///
    /// Reads remote state only; safe to call at any time, including while
    /// an install is running.
    pub async fn check(&self) -> Result<UpdateInfo> {
        self.emit(Stage::Checking, "Checking for updates");

        let release = fetch_latest_release(
            &self.client,
            &self.config.release_api_base,
            self.config.metadata_timeout(),
        )
        .await?;
        let info = build_update_info(&release, &self.context());

        info!(
            current = %info.current_version,
            latest = %info.latest_version,
            has_update = info.has_update,
            asset = ?info.asset.as_ref().map(|a| &a.name),
            "Update check complete"
        );

        let message = if info.has_update {
            format!("Version {} is available", info.latest_version)
        } else {
            format!("Version {} is up to date", info.current_version)
        };
        self.emit(Stage::Checked, message);

        Ok(info)
    }

    /// Download, verify and install the latest release.
    ///
    /// Only one install runs at a time; a concurrent call fails with
    /// [`UpdateError::AlreadyInProgress`] without touching anything.
    pub async fn install(&self) -> Result<InstallOutcome> {
        let _guard = InstallGuard::try_acquire(&self.install_in_flight)
            .ok_or(UpdateError::AlreadyInProgress)?;

        let info = self.check().await?;
        if !info.has_update {
            return Err(UpdateError::NoUpdateAvailable {
                current: info.current_version,
            });
        }
        if let Some(reason) = info.unsupported_reason {
            return Err(UpdateError::UnsupportedPlatform(reason));
        }
        let asset = info.asset.ok_or(UpdateError::NoCompatibleAsset)?;

        // Reject digests we cannot check before spending bandwidth
        let expected_digest = asset
            .digest
            .as_deref()
            .map(ExpectedDigest::parse)
            .transpose()?;

        let dir = self.config.download_dir();
        tokio::fs::create_dir_all(&dir).await?;
        let dest = dir.join(package_file_name(&asset.name));

        self.emit(Stage::Download, format!("Downloading {}", asset.name));
        let outcome = self
            .downloader
            .download(&asset.download_url, &dest, |p| {
                self.progress.emit(
                    ProgressEvent::new(Stage::Download, format!("Downloading {}%", p.percent))
                        .with_percent(p.percent)
                        .with_bytes(p.downloaded_bytes, Some(p.total_bytes)),
                );
            })
            .await?;

        let mut downloaded = ProgressEvent::new(Stage::Downloaded, format!("Downloaded {}", asset.name))
            .with_bytes(outcome.downloaded_bytes, outcome.total_bytes);
        if outcome.total_bytes.is_some() {
            downloaded = downloaded.with_percent(100);
        }
        self.progress.emit(downloaded);

        match expected_digest {
            Some(expected) => {
                if let Err(e) = expected.verify(&outcome.digest_hex) {
                    remove_partial(&dest).await;
                    return Err(e);
                }
                info!(sha256 = %outcome.digest_hex, "Package checksum verified");
            }
            None => warn!(asset = %asset.name, "Release declares no digest, package is unverified"),
        }

        self.emit(Stage::Installing, format!("Installing version {}", info.latest_version));
        let report = self.installer.install_package(&outcome.path).await?;
        self.emit(
            Stage::Installed,
            format!("Version {} installed, restart to apply", info.latest_version),
        );

        Ok(InstallOutcome {
            installed_version: info.latest_version,
            method: report.method,
            restart_required: true,
        })
    }

    /// Relaunch the host process and end this one
    pub fn restart(&self) {
        info!("Restarting application");
        self.relauncher.relaunch();
    }

    /// `checkForUpdates` at the UI boundary
    pub async fn check_for_updates(&self) -> CheckResponse {
        match self.check().await {
            Ok(info) => CheckResponse::success(info),
            Err(e) => {
                self.report_failure("check", &e);
                CheckResponse::failure(&e)
            }
        }
    }

    /// `installUpdate` at the UI boundary
    pub async fn install_update(&self) -> InstallResponse {
        let result = self.install().await;
        self.install_reply(&result)
    }

    /// Turn an [`install`](Self::install) result into the boundary reply,
    /// logging and emitting an `error` event on failure. Hosts that need
    /// the typed error call `install` and then this.
    pub fn install_reply(&self, result: &Result<InstallOutcome>) -> InstallResponse {
        match result {
            Ok(outcome) => {
                info!(version = %outcome.installed_version, method = %outcome.method, "Update installed");
                InstallResponse::success(outcome)
            }
            // The running install owns the progress stream; stay silent
            Err(e @ UpdateError::AlreadyInProgress) => InstallResponse::failure(e),
            Err(e) => {
                self.report_failure("install", e);
                InstallResponse::failure(e)
            }
        }
    }

    /// `restartApp` at the UI boundary; always reports success
    pub fn restart_app(&self) -> RestartResponse {
        self.restart();
        RestartResponse { ok: true }
    }

    /// `onProgress` at the UI boundary
    pub fn on_progress<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&ProgressEvent) + Send + Sync + 'static,
    {
        self.progress.subscribe(callback)
    }

    fn report_failure(&self, operation: &str, err: &UpdateError) {
        error!(operation, error = %err, "Update operation failed");
        self.emit(Stage::Error, err.to_string());
    }
}

/// Local file name for a downloaded asset, stripped of path components
fn package_file_name(asset_name: &str) -> PathBuf {
    let sanitized = sanitize_filename::sanitize(asset_name);
    if sanitized.is_empty() {
        PathBuf::from(FALLBACK_PACKAGE_NAME)
    } else {
        PathBuf::from(sanitized)
    }
}

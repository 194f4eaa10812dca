//! Common test utilities for pronote-updater integration tests
//!
//! - Mock release API and package host using wiremock
//! - Updater configs pointed at the mock server
//! - Scripted installer runners and relaunchers

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::Notify;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pronote_updater::client::HttpClient;
use pronote_updater::config::UpdaterConfig;
use pronote_updater::guard::UrlGuard;
use pronote_updater::installer::{CommandLine, CommandOutput, CommandRunner, CommandStatus, Installer};
use pronote_updater::platform::HostPlatform;
use pronote_updater::updater::{Relauncher, Updater};

/// Repository path the mock release API is served under
pub const REPO_PATH: &str = "/repos/Tarzzan/pronote-desktop";

/// Path of the latest-release endpoint on the mock server
pub const RELEASE_PATH: &str = "/repos/Tarzzan/pronote-desktop/releases/latest";

/// Version the updater under test claims to run
pub const CURRENT_VERSION: &str = "1.7.11";

/// Package file name for the next release on amd64
pub const AMD64_PACKAGE: &str = "pronote-desktop_1.7.12_amd64.deb";

/// Config pointed at `server`, downloading into `download_dir`
pub fn test_config(server: &MockServer, download_dir: &Path) -> UpdaterConfig {
    UpdaterConfig {
        release_api_base: format!("{}{}", server.uri(), REPO_PATH),
        allowed_hosts: vec!["127.0.0.1".to_string()],
        current_version: Some(CURRENT_VERSION.to_string()),
        metadata_timeout_secs: 5,
        download_timeout_secs: 10,
        installer_timeout_secs: 5,
        download_dir: Some(download_dir.to_path_buf()),
        allow_insecure_loopback: true,
        ..Default::default()
    }
}

/// HTTP client that accepts the mock server
pub fn test_client(server: &MockServer) -> HttpClient {
    let dir = std::env::temp_dir();
    let config = test_config(server, &dir);
    HttpClient::new(config.url_guard(), CURRENT_VERSION).unwrap()
}

/// HTTP client that accepts any plain-http server on 127.0.0.1
pub fn loopback_client() -> HttpClient {
    let guard = UrlGuard::new(["127.0.0.1"]).allow_insecure_loopback(true);
    HttpClient::new(guard, CURRENT_VERSION).unwrap()
}

/// Serve one response that declares `declared` bytes, sends only `sent`,
/// then closes the connection. Returns the base URL.
pub async fn serve_truncated_body(declared: usize, sent: usize) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 4096];
        let _ = socket.read(&mut request).await;

        let head = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\nContent-Length: {}\r\n\r\n",
            declared
        );
        socket.write_all(head.as_bytes()).await.unwrap();
        socket.write_all(&package_bytes(sent)).await.unwrap();
        socket.flush().await.unwrap();
        let _ = socket.shutdown().await;
    });

    format!("http://{}", addr)
}

/// Updater for linux/x64 with a scripted installer and relauncher
pub fn test_updater(config: UpdaterConfig, runner: Arc<dyn CommandRunner>) -> Updater {
    Updater::new(config)
        .unwrap()
        .with_platform(HostPlatform::new("linux", "x64"))
        .with_installer(Installer::new(runner, Duration::from_secs(5)))
        .with_relauncher(Arc::new(CountingRelauncher::default()))
}

/// Deterministic package payload of `len` bytes
pub fn package_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// URL on the mock server for a package path
pub fn package_url(server: &MockServer, file: &str) -> String {
    format!("{}/download/{}", server.uri(), file)
}

/// Release JSON shaped like the GitHub API, with one asset per `(name, digest)`
pub fn release_json(server: &MockServer, tag: &str, assets: &[(&str, Option<String>)]) -> Value {
    let assets: Vec<Value> = assets
        .iter()
        .map(|(name, digest)| {
            json!({
                "name": name,
                "size": 4096,
                "browser_download_url": package_url(server, name),
                "digest": digest,
            })
        })
        .collect();

    json!({
        "tag_name": tag,
        "name": format!("PRONOTE Desktop {}", tag.trim_start_matches('v')),
        "html_url": format!("https://github.com/Tarzzan/pronote-desktop/releases/tag/{}", tag),
        "published_at": "2026-09-30T12:00:00Z",
        "body": "  Bug fixes and improvements  ",
        "assets": assets,
    })
}

pub async fn mount_release(server: &MockServer, release: Value) {
    Mock::given(method("GET"))
        .and(path(RELEASE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(release))
        .mount(server)
        .await;
}

pub async fn mount_package(server: &MockServer, file: &str, bytes: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(format!("/download/{}", file)))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "application/octet-stream")
                .set_body_bytes(bytes),
        )
        .mount(server)
        .await;
}

/// Mount a release for 1.7.12 with an amd64 package and its correct digest
pub async fn mount_good_release(server: &MockServer) -> Vec<u8> {
    let bytes = package_bytes(64 * 1024);
    let digest = format!("sha256:{}", sha256_hex(&bytes));
    mount_release(server, release_json(server, "v1.7.12", &[(AMD64_PACKAGE, Some(digest))])).await;
    mount_package(server, AMD64_PACKAGE, bytes.clone()).await;
    bytes
}

/// Runner returning a fixed status and recording every command
pub struct FakeRunner {
    status: CommandStatus,
    calls: Mutex<Vec<CommandLine>>,
    /// When set, each run waits for a notification before returning
    gate: Option<Arc<Notify>>,
    started: Arc<Notify>,
}

impl FakeRunner {
    pub fn succeeding() -> Arc<Self> {
        Self::with_status(CommandStatus::Success)
    }

    pub fn with_status(status: CommandStatus) -> Arc<Self> {
        Arc::new(Self {
            status,
            calls: Mutex::new(Vec::new()),
            gate: None,
            started: Arc::new(Notify::new()),
        })
    }

    /// Runner that blocks inside `run` until `gate` is notified
    pub fn gated(gate: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self {
            status: CommandStatus::Success,
            calls: Mutex::new(Vec::new()),
            gate: Some(gate),
            started: Arc::new(Notify::new()),
        })
    }

    /// Resolves once a command has started running
    pub fn started(&self) -> Arc<Notify> {
        Arc::clone(&self.started)
    }

    pub fn calls(&self) -> Vec<CommandLine> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, command: &CommandLine, _timeout: Duration) -> CommandOutput {
        self.calls.lock().unwrap().push(command.clone());
        self.started.notify_one();
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        CommandOutput {
            status: self.status.clone(),
            output: "dpkg: error processing archive".to_string(),
        }
    }
}

/// Relauncher that only counts calls
#[derive(Default)]
pub struct CountingRelauncher {
    pub calls: AtomicUsize,
}

impl Relauncher for CountingRelauncher {
    fn relaunch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

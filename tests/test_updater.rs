//! End-to-end update flows against a mock release server
mod common;

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Notify;
use wiremock::MockServer;

use common::{
    mount_good_release, mount_package, mount_release, package_bytes, release_json, sha256_hex, test_config,
    test_updater, CountingRelauncher, FakeRunner, AMD64_PACKAGE,
};
use pronote_updater::installer::CommandStatus;
use pronote_updater::platform::HostPlatform;
use pronote_updater::progress::{ProgressEvent, Stage};
use pronote_updater::updater::Updater;
use pronote_updater::UpdateError;

fn record_stages(updater: &Updater) -> (pronote_updater::progress::Subscription, Arc<Mutex<Vec<ProgressEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let subscription = updater.on_progress(move |event| sink.lock().unwrap().push(event.clone()));
    (subscription, events)
}

fn stages(events: &Mutex<Vec<ProgressEvent>>) -> Vec<Stage> {
    let mut stages: Vec<Stage> = events.lock().unwrap().iter().map(|e| e.stage).collect();
    stages.dedup();
    stages
}

// ============================================================================
// Check
// ============================================================================

#[tokio::test]
async fn test_check_reports_available_update() {
    let server = MockServer::start().await;
    mount_good_release(&server).await;
    let dir = TempDir::new().unwrap();
    let updater = test_updater(test_config(&server, dir.path()), FakeRunner::succeeding());

    let response = updater.check_for_updates().await;
    assert!(response.ok);
    let info = response.info.unwrap();
    assert!(info.has_update);
    assert_eq!(info.current_version, "1.7.11");
    assert_eq!(info.latest_version, "1.7.12");
    assert_eq!(info.asset.unwrap().name, AMD64_PACKAGE);
}

#[tokio::test]
async fn test_check_json_shape() {
    let server = MockServer::start().await;
    mount_good_release(&server).await;
    let dir = TempDir::new().unwrap();
    let updater = test_updater(test_config(&server, dir.path()), FakeRunner::succeeding());

    let json = serde_json::to_value(updater.check_for_updates().await).unwrap();
    assert_eq!(json["ok"], true);
    assert_eq!(json["info"]["latestVersion"], "1.7.12");
    assert_eq!(json["info"]["hasUpdate"], true);
    assert!(json["info"]["asset"]["downloadUrl"].as_str().unwrap().ends_with(AMD64_PACKAGE));
}

#[tokio::test]
async fn test_check_network_failure_is_folded_into_reply() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&server, dir.path());
    // Nothing listens on port 9 of loopback
    config.release_api_base = "http://127.0.0.1:9/repos/Tarzzan/pronote-desktop".to_string();
    let updater = test_updater(config, FakeRunner::succeeding());
    let (_sub, events) = record_stages(&updater);

    let response = updater.check_for_updates().await;
    assert!(!response.ok);
    assert!(response.info.is_none());
    assert!(response.error.unwrap().starts_with("Network error"));
    assert_eq!(stages(&events), vec![Stage::Checking, Stage::Error]);
}

// ============================================================================
// Install
// ============================================================================

#[tokio::test]
async fn test_full_install() {
    let server = MockServer::start().await;
    let bytes = mount_good_release(&server).await;
    let dir = TempDir::new().unwrap();
    let runner = FakeRunner::succeeding();
    let updater = test_updater(test_config(&server, dir.path()), runner.clone());
    let (_sub, events) = record_stages(&updater);

    let response = updater.install_update().await;
    assert!(response.ok, "{:?}", response.error);
    assert_eq!(response.installed_version.as_deref(), Some("1.7.12"));
    assert_eq!(response.restart_required, Some(true));
    assert!(response.manual_command.is_none());

    let package = dir.path().join(AMD64_PACKAGE);
    assert_eq!(std::fs::read(&package).unwrap(), bytes);

    let calls = runner.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].program, "pkexec");
    assert_eq!(calls[0].args.last().unwrap(), &package.to_string_lossy());

    assert_eq!(
        stages(&events),
        vec![
            Stage::Checking,
            Stage::Checked,
            Stage::Download,
            Stage::Downloaded,
            Stage::Installing,
            Stage::Installed,
        ]
    );

    let recorded = events.lock().unwrap();
    let percents: Vec<u8> = recorded.iter().filter_map(|e| e.percent).collect();
    assert!(percents.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(percents.last(), Some(&100));
}

#[tokio::test]
async fn test_checksum_mismatch_never_reaches_installer() {
    let server = MockServer::start().await;
    let bytes = package_bytes(16 * 1024);
    let wrong = format!("sha256:{}", "ab".repeat(32));
    mount_release(&server, release_json(&server, "v1.7.12", &[(AMD64_PACKAGE, Some(wrong))])).await;
    mount_package(&server, AMD64_PACKAGE, bytes).await;

    let dir = TempDir::new().unwrap();
    let runner = FakeRunner::succeeding();
    let updater = test_updater(test_config(&server, dir.path()), runner.clone());
    let (_sub, events) = record_stages(&updater);

    let err = updater.install().await.unwrap_err();
    assert!(matches!(err, UpdateError::ChecksumMismatch { .. }), "got {err:?}");
    assert!(runner.calls().is_empty());
    assert!(!dir.path().join(AMD64_PACKAGE).exists());
    assert!(!stages(&events).contains(&Stage::Installing));
}

#[tokio::test]
async fn test_unsupported_digest_is_refused_before_download() {
    let server = MockServer::start().await;
    mount_release(
        &server,
        release_json(&server, "v1.7.12", &[(AMD64_PACKAGE, Some("sha512:abcd".to_string()))]),
    )
    .await;
    mount_package(&server, AMD64_PACKAGE, package_bytes(1024)).await;

    let dir = TempDir::new().unwrap();
    let runner = FakeRunner::succeeding();
    let updater = test_updater(test_config(&server, dir.path()), runner.clone());

    let err = updater.install().await.unwrap_err();
    assert!(matches!(err, UpdateError::UnsupportedDigest(_)), "got {err:?}");
    assert!(runner.calls().is_empty());
    assert!(!dir.path().join(AMD64_PACKAGE).exists());
}

#[tokio::test]
async fn test_install_without_digest_proceeds() {
    let server = MockServer::start().await;
    mount_release(&server, release_json(&server, "v1.7.12", &[(AMD64_PACKAGE, None)])).await;
    mount_package(&server, AMD64_PACKAGE, package_bytes(2048)).await;

    let dir = TempDir::new().unwrap();
    let updater = test_updater(test_config(&server, dir.path()), FakeRunner::succeeding());
    let outcome = updater.install().await.unwrap();
    assert_eq!(outcome.installed_version, "1.7.12");
    assert_eq!(outcome.method, "pkexec");
}

#[tokio::test]
async fn test_install_when_current_fails() {
    let server = MockServer::start().await;
    mount_release(&server, release_json(&server, "v1.7.11", &[(AMD64_PACKAGE, None)])).await;

    let dir = TempDir::new().unwrap();
    let runner = FakeRunner::succeeding();
    let updater = test_updater(test_config(&server, dir.path()), runner.clone());

    let err = updater.install().await.unwrap_err();
    assert!(matches!(err, UpdateError::NoUpdateAvailable { ref current } if current == "1.7.11"));
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn test_install_on_unsupported_platform() {
    let server = MockServer::start().await;
    mount_good_release(&server).await;

    let dir = TempDir::new().unwrap();
    let runner = FakeRunner::succeeding();
    let updater = test_updater(test_config(&server, dir.path()), runner.clone())
        .with_platform(HostPlatform::new("windows", "x64"));

    let response = updater.install_update().await;
    assert!(!response.ok);
    assert_eq!(
        response.error.as_deref(),
        Some("Automatic updates are not supported on windows.")
    );
    assert!(runner.calls().is_empty());
    assert!(server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .all(|r| !r.url.path().starts_with("/download/")));
}

#[tokio::test]
async fn test_install_without_matching_asset() {
    let server = MockServer::start().await;
    mount_release(
        &server,
        release_json(
            &server,
            "v1.7.12",
            &[
                ("pronote-desktop_1.7.12_arm64.deb", None),
                ("pronote-desktop_1.7.12_armhf.deb", None),
            ],
        ),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let updater = test_updater(test_config(&server, dir.path()), FakeRunner::succeeding());
    let err = updater.install().await.unwrap_err();
    assert!(matches!(err, UpdateError::NoCompatibleAsset), "got {err:?}");
}

#[tokio::test]
async fn test_installer_failure_offers_manual_command() {
    let server = MockServer::start().await;
    mount_good_release(&server).await;

    let dir = TempDir::new().unwrap();
    let runner = FakeRunner::with_status(CommandStatus::Failed(Some(1)));
    let updater = test_updater(test_config(&server, dir.path()), runner.clone());
    let (_sub, events) = record_stages(&updater);

    let response = updater.install_update().await;
    assert!(!response.ok);
    let manual = response.manual_command.unwrap();
    assert!(manual.starts_with("sudo apt-get install -y "));
    assert!(manual.ends_with(AMD64_PACKAGE));

    // Both escalation strategies were attempted
    let programs: Vec<String> = runner.calls().into_iter().map(|c| c.program).collect();
    assert_eq!(programs, vec!["pkexec".to_string(), "sudo".to_string()]);
    assert_eq!(stages(&events).last(), Some(&Stage::Error));
}

// ============================================================================
// Single flight
// ============================================================================

#[tokio::test]
async fn test_concurrent_install_is_rejected() {
    let server = MockServer::start().await;
    mount_good_release(&server).await;

    let dir = TempDir::new().unwrap();
    let gate = Arc::new(Notify::new());
    let runner = FakeRunner::gated(Arc::clone(&gate));
    let started = runner.started();
    let updater = Arc::new(test_updater(test_config(&server, dir.path()), runner.clone()));

    let first = tokio::spawn({
        let updater = Arc::clone(&updater);
        async move { updater.install_update().await }
    });

    // Wait until the first install is inside the package manager
    tokio::time::timeout(Duration::from_secs(10), started.notified())
        .await
        .unwrap();

    let (_sub, events) = record_stages(&updater);
    let second = updater.install_update().await;
    assert!(!second.ok);
    assert!(second.error.unwrap().contains("already in progress"));
    assert!(events.lock().unwrap().is_empty());

    gate.notify_one();
    let first = first.await.unwrap();
    assert!(first.ok, "{:?}", first.error);
    assert_eq!(runner.calls().len(), 1);

    // The slot is free again once the first install returns
    gate.notify_one();
    let third = updater.install_update().await;
    assert!(third.ok, "{:?}", third.error);
    assert_eq!(runner.calls().len(), 2);
}

#[tokio::test]
async fn test_retry_after_failure_is_allowed() {
    let server = MockServer::start().await;
    mount_release(&server, release_json(&server, "v1.7.12", &[])).await;

    let dir = TempDir::new().unwrap();
    let updater = test_updater(test_config(&server, dir.path()), FakeRunner::succeeding());

    for _ in 0..2 {
        let err = updater.install().await.unwrap_err();
        assert!(matches!(err, UpdateError::NoCompatibleAsset), "got {err:?}");
    }
}

#[tokio::test]
async fn test_check_runs_during_install() {
    let server = MockServer::start().await;
    mount_good_release(&server).await;

    let dir = TempDir::new().unwrap();
    let gate = Arc::new(Notify::new());
    let runner = FakeRunner::gated(Arc::clone(&gate));
    let started = runner.started();
    let updater = Arc::new(test_updater(test_config(&server, dir.path()), runner));

    let install = tokio::spawn({
        let updater = Arc::clone(&updater);
        async move { updater.install().await }
    });
    tokio::time::timeout(Duration::from_secs(10), started.notified())
        .await
        .unwrap();

    let response = updater.check_for_updates().await;
    assert!(response.ok);

    gate.notify_one();
    install.await.unwrap().unwrap();
}

// ============================================================================
// Restart and subscriptions
// ============================================================================

#[tokio::test]
async fn test_restart_uses_relauncher() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let relauncher = Arc::new(CountingRelauncher::default());
    let updater = test_updater(test_config(&server, dir.path()), FakeRunner::succeeding())
        .with_relauncher(relauncher.clone());

    let response = updater.restart_app();
    assert!(response.ok);
    assert_eq!(relauncher.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unsubscribed_listener_gets_nothing() {
    let server = MockServer::start().await;
    mount_good_release(&server).await;
    let dir = TempDir::new().unwrap();
    let updater = test_updater(test_config(&server, dir.path()), FakeRunner::succeeding());

    let (subscription, events) = record_stages(&updater);
    subscription.unsubscribe();
    updater.check().await.unwrap();
    assert!(events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_downloaded_file_matches_declared_digest() {
    let server = MockServer::start().await;
    let bytes = mount_good_release(&server).await;
    let dir = TempDir::new().unwrap();
    let updater = test_updater(test_config(&server, dir.path()), FakeRunner::succeeding());

    updater.install().await.unwrap();
    let on_disk = std::fs::read(dir.path().join(AMD64_PACKAGE)).unwrap();
    assert_eq!(sha256_hex(&on_disk), sha256_hex(&bytes));
}

//! Subcommand execution
//!
//! Each subcommand calls the matching UI-boundary method on [`Updater`] and
//! renders the reply, either as raw JSON or as short human-readable lines.

use anyhow::{Context, Result};
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::cli::args::{Args, Command, ReportArgs, RestartArgs};
use crate::config::UpdaterConfig;
use crate::errors::UpdateError;
use crate::progress::{ProgressEvent, Stage};
use crate::status::ExitStatus;
use crate::updater::{CheckResponse, InstallResponse, ProcessRelauncher, Updater};

/// Run the parsed command line to completion
pub fn run(args: Args) -> Result<ExitStatus> {
    let config = load_config(args.config.as_deref())?;
    let updater = Updater::new(config).context("Failed to initialise the updater")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;

    runtime.block_on(async {
        match &args.command {
            Command::Check(report) => check(&updater, report).await,
            Command::Install(report) => install(&updater, report).await,
            Command::Restart(restart) => self::restart(updater, restart),
        }
    })
}

fn load_config(path: Option<&Path>) -> Result<UpdaterConfig> {
    let config = match path {
        Some(path) => UpdaterConfig::load_from(path),
        None => UpdaterConfig::load(),
    }?;
    Ok(config)
}

async fn check(updater: &Updater, report: &ReportArgs) -> Result<ExitStatus> {
    let response = updater.check_for_updates().await;

    if report.json {
        print_json(&response)?;
    } else {
        print_check(&response);
    }

    Ok(ExitStatus::from_check(&response, report.fail_if_current))
}

async fn install(updater: &Updater, report: &ReportArgs) -> Result<ExitStatus> {
    let bar = if report.json {
        ProgressBar::hidden()
    } else {
        new_progress_bar()
    };

    let (subscription, mut events) = updater.progress().subscribe_channel();
    let render_bar = bar.clone();
    let renderer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            render_event(&render_bar, &event);
        }
    });

    let result = updater.install().await;
    let response = updater.install_reply(&result);
    // Dropping the subscription closes the channel and ends the renderer
    drop(subscription);
    if let Err(e) = renderer.await {
        tracing::warn!(error = %e, "Progress renderer stopped abnormally");
    }

    if response.ok {
        bar.finish_and_clear();
    } else {
        bar.abandon();
    }
    let up_to_date = matches!(result, Err(UpdateError::NoUpdateAvailable { .. }));

    if report.json {
        print_json(&response)?;
    } else {
        print_install(&response);
    }

    Ok(ExitStatus::from_install(&response, up_to_date, report.fail_if_current))
}

fn restart(updater: Updater, restart: &RestartArgs) -> Result<ExitStatus> {
    let relauncher = ProcessRelauncher::new(&restart.exe, restart.args.clone());
    let updater = updater.with_relauncher(Arc::new(relauncher));
    let response = updater.restart_app();

    if restart.json {
        print_json(&response)?;
    } else {
        println!("Restarting {}", restart.exe.display());
    }

    // Outlive the exit grace period so the relaunch is never cut short
    std::thread::sleep(crate::updater::restart::EXIT_GRACE * 2);
    Ok(ExitStatus::Success)
}

fn new_progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

fn render_event(bar: &ProgressBar, event: &ProgressEvent) {
    if let Some(percent) = event.percent {
        bar.set_position(u64::from(percent));
    }

    let message = match (event.stage, event.downloaded_bytes, event.total_bytes) {
        (Stage::Download | Stage::Downloaded, Some(done), Some(total)) => {
            format!("{} / {}", format_size(done, BINARY), format_size(total, BINARY))
        }
        (Stage::Download | Stage::Downloaded, Some(done), None) => {
            format!("{} downloaded", format_size(done, BINARY))
        }
        _ => event.message.clone(),
    };
    bar.set_message(message);
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialise reply")?;
    println!("{}", json);
    Ok(())
}

fn print_check(response: &CheckResponse) {
    let Some(info) = &response.info else {
        eprintln!("Update check failed: {}", response.error.as_deref().unwrap_or("unknown error"));
        return;
    };

    if !info.has_update {
        println!("PRONOTE Desktop {} is up to date", info.current_version);
        return;
    }

    println!("Update available: {} -> {}", info.current_version, info.latest_version);
    if !info.release_url.is_empty() {
        println!("Release: {}", info.release_url);
    }
    match (&info.asset, &info.unsupported_reason) {
        (_, Some(reason)) => println!("{}", reason),
        (Some(asset), None) => println!("Package: {} ({})", asset.name, format_size(asset.size, BINARY)),
        (None, None) => println!("No package for this platform in the release"),
    }
}

fn print_install(response: &InstallResponse) {
    if response.ok {
        println!(
            "Installed PRONOTE Desktop {}. Restart the application to apply it.",
            response.installed_version.as_deref().unwrap_or("")
        );
        return;
    }

    eprintln!("Update failed: {}", response.error.as_deref().unwrap_or("unknown error"));
    if let Some(command) = &response.manual_command {
        eprintln!("Install it manually with:\n  {}", command);
    }
}

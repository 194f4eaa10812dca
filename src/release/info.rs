//! Derive the update summary the UI displays

use serde::Serialize;
use std::cmp::Ordering;

use super::asset::{select_asset, SUPPORTED_OS};
use super::model::ReleaseDescriptor;
use crate::strings::take_chars;
use crate::version::{compare_versions, to_release_version};

/// Default cap on release notes length, in characters
pub const DEFAULT_NOTES_LIMIT: usize = 10_000;

/// Inputs to [`build_update_info`] that describe the running client
#[derive(Debug, Clone)]
pub struct UpdateContext {
    pub current_version: String,
    pub os: String,
    pub arch: String,
    pub notes_limit: usize,
}

impl UpdateContext {
    pub fn new(current_version: impl Into<String>, os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            current_version: current_version.into(),
            os: os.into(),
            arch: arch.into(),
            notes_limit: DEFAULT_NOTES_LIMIT,
        }
    }
}

/// Package chosen for this platform
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedAsset {
    pub name: String,
    pub size: u64,
    pub download_url: String,
    pub digest: Option<String>,
}

/// Result of comparing the latest release against the running client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInfo {
    pub current_version: String,
    pub latest_version: String,
    pub has_update: bool,
    pub release_name: String,
    pub release_url: String,
    pub published_at: String,
    pub notes: String,
    pub asset: Option<SelectedAsset>,
    pub unsupported_reason: Option<String>,
}

/// Trim release notes and cap their length
pub fn sanitize_notes(body: Option<&str>, limit: usize) -> String {
    let text = body.unwrap_or("").trim();
    take_chars(text, limit).to_string()
}

/// Build the [`UpdateInfo`] for `release` as seen from `ctx`
pub fn build_update_info(release: &ReleaseDescriptor, ctx: &UpdateContext) -> UpdateInfo {
    let latest_version = to_release_version(release.tag_or_name());
    let has_update = compare_versions(&latest_version, &ctx.current_version) == Ordering::Greater;

    let asset = select_asset(release, &ctx.os, &ctx.arch).and_then(|asset| {
        let (name, url) = asset.usable()?;
        Some(SelectedAsset {
            name: name.to_string(),
            size: asset.size,
            download_url: url.to_string(),
            digest: asset.digest.clone(),
        })
    });

    let unsupported_reason = (ctx.os != SUPPORTED_OS)
        .then(|| format!("Automatic updates are not supported on {}.", ctx.os));

    UpdateInfo {
        current_version: ctx.current_version.clone(),
        latest_version,
        has_update,
        release_name: release.name.clone().unwrap_or_default(),
        release_url: release.html_url.clone().unwrap_or_default(),
        published_at: release.published_at.clone().unwrap_or_default(),
        notes: sanitize_notes(release.body.as_deref(), ctx.notes_limit),
        asset,
        unsupported_reason,
    }
}

//! Fetch the latest release descriptor

use tracing::info;

use super::model::ReleaseDescriptor;
use crate::client::{HttpClient, ACCEPT_RELEASE_JSON};
use crate::errors::{Result, UpdateError};
use std::time::Duration;

/// `GET {base_api_url}/releases/latest` and parse the JSON body
pub async fn fetch_latest_release(
    client: &HttpClient,
    base_api_url: &str,
    timeout: Duration,
) -> Result<ReleaseDescriptor> {
    let url = latest_release_url(base_api_url);
    let (final_url, response) = client
        .get_following_redirects(&url, ACCEPT_RELEASE_JSON, timeout)
        .await?;

    let body = response.bytes().await?;
    let release: ReleaseDescriptor = serde_json::from_slice(&body)
        .map_err(|e| UpdateError::MalformedResponse(format!("{} ({})", e, final_url)))?;

    info!(tag = %release.tag_or_name(), assets = release.assets.len(), "Fetched latest release");
    Ok(release)
}

fn latest_release_url(base_api_url: &str) -> String {
    format!("{}/releases/latest", base_api_url.trim_end_matches('/'))
}

//! Package download with progress and running SHA-256

use reqwest::header::CONTENT_LENGTH;
use reqwest::Response;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{info, warn};

use super::status::{DownloadProgress, PercentTracker};
use crate::client::{HttpClient, ACCEPT_BINARY};
use crate::errors::{Result, UpdateError};

/// What a finished download produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    pub path: PathBuf,
    /// Lowercase hex SHA-256 of the bytes written
    pub digest_hex: String,
    pub downloaded_bytes: u64,
    pub total_bytes: Option<u64>,
}

/// Streams release packages to disk
#[derive(Debug, Clone)]
pub struct PackageDownloader {
    client: HttpClient,
    timeout: Duration,
}

impl PackageDownloader {
    pub fn new(client: HttpClient, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Download `url` to `dest`, hashing as it goes.
    ///
    /// `on_progress` fires once per percentage point when the size is known.
    /// If anything fails after `dest` was created, the partial file is removed
    /// before the error is returned.
    pub async fn download<F>(&self, url: &str, dest: &Path, mut on_progress: F) -> Result<DownloadOutcome>
    where
        F: FnMut(DownloadProgress),
    {
        let (final_url, response) = self
            .client
            .get_following_redirects(url, ACCEPT_BINARY, self.timeout)
            .await?;

        let total_bytes = content_length(&response);
        info!(url = %final_url, dest = %dest.display(), total_bytes = ?total_bytes, "Downloading package");

        let file = File::create(dest).await?;
        match stream_to_file(response, file, total_bytes, &mut on_progress).await {
            Ok((digest_hex, downloaded_bytes)) => {
                info!(bytes = downloaded_bytes, sha256 = %digest_hex, "Download complete");
                Ok(DownloadOutcome {
                    path: dest.to_path_buf(),
                    digest_hex,
                    downloaded_bytes,
                    total_bytes,
                })
            }
            Err(e) => {
                warn!(dest = %dest.display(), error = %e, "Download failed, removing partial file");
                remove_partial(dest).await;
                Err(e)
            }
        }
    }
}

/// Parse the Content-Length header
fn content_length(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
}

async fn stream_to_file<F>(
    mut response: Response,
    file: File,
    total_bytes: Option<u64>,
    on_progress: &mut F,
) -> Result<(String, u64)>
where
    F: FnMut(DownloadProgress),
{
    let mut writer = BufWriter::new(file);
    let mut hasher = Sha256::new();
    let mut tracker = PercentTracker::new(total_bytes);

    while let Some(chunk) = response.chunk().await? {
        hasher.update(&chunk);
        writer.write_all(&chunk).await?;

        if let Some(progress) = tracker.advance(chunk.len() as u64) {
            on_progress(progress);
        }
    }

    writer.flush().await?;
    writer.into_inner().sync_all().await?;

    let downloaded = tracker.downloaded();
    if let Some(total) = total_bytes {
        if downloaded != total {
            return Err(UpdateError::Network(format!(
                "incomplete download: received {} of {} bytes",
                downloaded, total
            )));
        }
    }

    Ok((hex::encode(hasher.finalize()), downloaded))
}

/// Remove a partially written file; a file that is already gone is fine
pub(crate) async fn remove_partial(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "Could not remove partial download");
        }
    }
}

//! HTTP request sending with guarded, bounded redirects
//!
//! Automatic redirects are disabled on the underlying client: every hop is
//! resolved here so the URL guard sees each target before it is contacted.

use reqwest::header::{ACCEPT, LOCATION};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::errors::{Result, UpdateError};
use crate::guard::UrlGuard;
use crate::strings::truncate_str;

/// Maximum number of redirect hops before giving up
pub const MAX_REDIRECTS: usize = 5;

/// Longest error body excerpt kept in an `Http` error
const ERROR_BODY_LIMIT: usize = 300;

/// Accept header for release metadata
pub const ACCEPT_RELEASE_JSON: &str = "application/vnd.github+json";

/// Accept header for package downloads
pub const ACCEPT_BINARY: &str = "application/octet-stream";

/// Guarded HTTP client shared by the release fetcher and the downloader
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    guard: UrlGuard,
    user_agent: String,
}

impl HttpClient {
    /// Build a client identifying itself as `pronote-desktop/<version>`
    pub fn new(guard: UrlGuard, current_version: &str) -> Result<Self> {
        let user_agent = format!("pronote-desktop/{}", current_version);
        let client = Client::builder()
            .user_agent(user_agent.clone())
            .redirect(reqwest::redirect::Policy::none())
            .referer(false)
            .build()
            .map_err(|e| UpdateError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            guard,
            user_agent,
        })
    }

    pub fn guard(&self) -> &UrlGuard {
        &self.guard
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// GET `url`, following up to [`MAX_REDIRECTS`] redirects.
    ///
    /// Returns the final URL and a 2xx response whose body has not been read.
    /// Non-2xx responses are drained and turned into [`UpdateError::Http`].
    pub async fn get_following_redirects(
        &self,
        url: &str,
        accept: &str,
        timeout: Duration,
    ) -> Result<(Url, Response)> {
        let mut current_url = self.guard.check(url)?;
        let mut redirect_count = 0;

        loop {
            debug!(url = %current_url, hop = redirect_count, "GET");
            let response = self
                .client
                .get(current_url.clone())
                .header(ACCEPT, accept)
                .timeout(timeout)
                .send()
                .await?;

            let status = response.status();
            if is_followed_redirect(status) {
                redirect_count += 1;
                if redirect_count > MAX_REDIRECTS {
                    return Err(UpdateError::TooManyRedirects(MAX_REDIRECTS));
                }

                let location = match response.headers().get(LOCATION) {
                    Some(loc) => loc
                        .to_str()
                        .map_err(|_| UpdateError::InvalidUrl("non-ASCII Location header".to_string()))?
                        .to_string(),
                    None => {
                        return Err(UpdateError::Http {
                            status: status.as_u16(),
                            body: "redirect without Location header".to_string(),
                        })
                    }
                };

                // Resolve relative URL against current URL, then re-check it
                let next_url = current_url
                    .join(&location)
                    .map_err(|e| UpdateError::InvalidUrl(format!("{}: {}", location, e)))?;
                self.guard.check_url(&next_url)?;

                info!(from = %current_url, to = %next_url, status = status.as_u16(), "Following redirect");
                current_url = next_url;
                continue;
            }

            if !status.is_success() {
                return Err(http_error(response).await);
            }

            return Ok((current_url, response));
        }
    }
}

/// Redirect codes that are followed; 300 and 304 are not redirects to a new resource
fn is_followed_redirect(status: StatusCode) -> bool {
    matches!(status.as_u16(), 301 | 302 | 303 | 307 | 308)
}

/// Drain a failed response and build the error from its status and body
async fn http_error(response: Response) -> UpdateError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    UpdateError::Http {
        status,
        body: truncate_str(body.trim(), ERROR_BODY_LIMIT),
    }
}

//! URL allow-list gate
//!
//! Every outbound request of the update pipeline, including each redirect
//! hop, goes through [`UrlGuard::check`] first.

use std::collections::HashSet;
use std::net::IpAddr;
use url::Url;

use crate::errors::{Result, UpdateError};

/// Hosts the pipeline may talk to: release API, release pages and the two
/// CDNs GitHub redirects asset downloads to.
pub const DEFAULT_ALLOWED_HOSTS: [&str; 4] = [
    "api.github.com",
    "github.com",
    "objects.githubusercontent.com",
    "release-assets.githubusercontent.com",
];

/// Validate that `url_str` is an absolute HTTPS URL on an allowed host.
///
/// Host matching is exact: `api.github.com` does not allow
/// `evil.api.github.com`.
///
/// ```
/// use std::collections::HashSet;
/// use pronote_updater::guard::assert_allowed_url;
///
/// let hosts: HashSet<String> = ["api.github.com".to_string()].into();
/// let url = assert_allowed_url("https://api.github.com/repos/a/b", &hosts).unwrap();
/// assert_eq!(url.host_str(), Some("api.github.com"));
/// assert!(assert_allowed_url("http://api.github.com/", &hosts).is_err());
/// ```
pub fn assert_allowed_url(url_str: &str, allowed_hosts: &HashSet<String>) -> Result<Url> {
    UrlGuard::new(allowed_hosts.iter().cloned()).check(url_str)
}

/// Allow-list of hosts plus the scheme policy
#[derive(Debug, Clone)]
pub struct UrlGuard {
    allowed_hosts: HashSet<String>,
    /// Accept plain `http` for loopback hosts that are on the allow-list.
    /// Only meant for a local mock release server.
    allow_insecure_loopback: bool,
}

impl Default for UrlGuard {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_HOSTS.iter().map(|h| h.to_string()))
    }
}

impl UrlGuard {
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_hosts: hosts.into_iter().map(Into::into).collect(),
            allow_insecure_loopback: false,
        }
    }

    pub fn allow_insecure_loopback(mut self, allow: bool) -> Self {
        self.allow_insecure_loopback = allow;
        self
    }

    pub fn allowed_hosts(&self) -> &HashSet<String> {
        &self.allowed_hosts
    }

    /// Parse and validate a URL string
    pub fn check(&self, url_str: &str) -> Result<Url> {
        let parsed = Url::parse(url_str)
            .map_err(|e| UpdateError::InvalidUrl(format!("{}: {}", url_str, e)))?;
        self.check_url(&parsed)?;
        Ok(parsed)
    }

    /// Validate an already-parsed URL (redirect targets)
    pub fn check_url(&self, url: &Url) -> Result<()> {
        // Bracketed IPv6 literals come back as "[::1]"
        let host = url
            .host_str()
            .map(|h| h.trim_start_matches('[').trim_end_matches(']'))
            .unwrap_or("");

        let scheme_ok = match url.scheme() {
            "https" => true,
            "http" => self.allow_insecure_loopback && is_loopback(host),
            _ => false,
        };
        if !scheme_ok {
            return Err(UpdateError::InsecureScheme(url.to_string()));
        }

        if !self.allowed_hosts.contains(host) {
            return Err(UpdateError::HostNotAllowed(host.to_string()));
        }

        Ok(())
    }
}

/// Loopback IP address or `localhost`
fn is_loopback(host: &str) -> bool {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return ip.is_loopback();
    }
    host == "localhost"
}

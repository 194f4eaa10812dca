//! Release descriptor as returned by the release host

use serde::{Deserialize, Deserializer};

/// Latest-release metadata. Fields are optional on the wire so a sparse
/// or unusual release never fails to parse.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReleaseDescriptor {
    #[serde(default)]
    pub tag_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

impl ReleaseDescriptor {
    /// Tag if present, release name otherwise
    pub fn tag_or_name(&self) -> &str {
        self.tag_name
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or(self.name.as_deref())
            .unwrap_or("")
    }
}

/// Read an explicit `null` as the type's default
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Downloadable file attached to a release
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Asset {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub size: u64,
    #[serde(default)]
    pub browser_download_url: Option<String>,
    /// `sha256:<hex>` when the host publishes one
    #[serde(default)]
    pub digest: Option<String>,
}

impl Asset {
    /// Name and download URL, if the asset has both
    pub fn usable(&self) -> Option<(&str, &str)> {
        match (self.name.as_deref(), self.browser_download_url.as_deref()) {
            (Some(name), Some(url)) => Some((name, url)),
            _ => None,
        }
    }
}

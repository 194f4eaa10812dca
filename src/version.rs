//! Lossy version parsing and comparison
//!
//! Release tags come from a remote host and are not trusted to be valid
//! semver, so parsing never fails: anything it cannot read becomes 0.

use std::cmp::Ordering;

/// Normalize a version string into a `[major, minor, patch]` triplet.
///
/// Strips a leading `v`, drops any pre-release suffix after the first `-`,
/// and reads the leading digits of each dot-separated component.
///
/// ```
/// use pronote_updater::version::normalize_version;
/// assert_eq!(normalize_version("v1.7.11-beta"), [1, 7, 11]);
/// assert_eq!(normalize_version("garbage"), [0, 0, 0]);
/// ```
pub fn normalize_version(input: &str) -> [u64; 3] {
    let trimmed = input.trim();
    let without_prefix = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);
    let core = without_prefix.split('-').next().unwrap_or("");

    let mut triplet = [0u64; 3];
    for (slot, part) in triplet.iter_mut().zip(core.split('.')) {
        *slot = parse_leading_number(part);
    }
    triplet
}

/// Leading decimal digits of `part`, or 0 if there are none or they overflow
fn parse_leading_number(part: &str) -> u64 {
    let part = part.trim_start();
    let end = part
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(part.len());
    part[..end].parse().unwrap_or(0)
}

/// Compare two version strings by their normalized triplets
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    normalize_version(a).cmp(&normalize_version(b))
}

/// Turn a release tag into the version string shown to the user
pub fn to_release_version(tag_or_name: &str) -> String {
    let trimmed = tag_or_name.trim();
    trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed)
        .to_string()
}

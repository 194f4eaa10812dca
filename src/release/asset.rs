//! Pick the installable package for the running platform

use super::model::{Asset, ReleaseDescriptor};

/// The only OS family packages are published for
pub const SUPPORTED_OS: &str = "linux";

/// Package format installed on that OS family
pub const PACKAGE_EXTENSION: &str = ".deb";

/// Map a CPU architecture name onto the Debian label used in package names
pub fn debian_arch(arch: &str) -> &str {
    match arch {
        "x64" | "x86_64" | "amd64" => "amd64",
        "arm64" | "aarch64" => "arm64",
        "ia32" | "x86" | "i386" | "i686" => "i386",
        "arm" | "armv7" | "armv7l" => "armhf",
        other => other,
    }
}

/// Select the release asset to install on `os`/`arch`.
///
/// An asset named for the exact architecture wins. Failing that, a lone
/// package is assumed to be the only build. Anything else is ambiguous and
/// yields `None`.
pub fn select_asset<'a>(release: &'a ReleaseDescriptor, os: &str, arch: &str) -> Option<&'a Asset> {
    if os != SUPPORTED_OS {
        return None;
    }

    let candidates: Vec<&Asset> = release
        .assets
        .iter()
        .filter(|asset| {
            asset
                .usable()
                .is_some_and(|(name, _)| name.ends_with(PACKAGE_EXTENSION))
        })
        .collect();

    let suffix = format!("_{}{}", debian_arch(arch), PACKAGE_EXTENSION);
    let exact = candidates.iter().copied().find(|asset| {
        asset.name.as_deref().is_some_and(|name| name.contains(&suffix))
    });

    match (exact, candidates.as_slice()) {
        (Some(asset), _) => Some(asset),
        (None, [only]) => Some(*only),
        _ => None,
    }
}

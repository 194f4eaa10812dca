//! Release metadata: fetching, asset selection and update derivation

pub mod asset;
pub mod fetcher;
pub mod info;
pub mod model;

pub use asset::{debian_arch, select_asset, PACKAGE_EXTENSION, SUPPORTED_OS};
pub use fetcher::fetch_latest_release;
pub use info::{build_update_info, sanitize_notes, SelectedAsset, UpdateContext, UpdateInfo};
pub use model::{Asset, ReleaseDescriptor};

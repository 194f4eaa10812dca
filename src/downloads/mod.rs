//! Package downloads: streaming, progress and digest verification

pub mod digest;
pub mod downloader;
pub mod status;

pub use digest::ExpectedDigest;
pub use downloader::{DownloadOutcome, PackageDownloader};
pub use status::{DownloadProgress, PercentTracker};

//! Download progress tracking

/// Snapshot handed to the progress callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    pub percent: u8,
    pub downloaded_bytes: u64,
    pub total_bytes: u64,
}

/// Turns byte counts into whole-percent progress, reporting each
/// percentage point at most once
#[derive(Debug, Clone)]
pub struct PercentTracker {
    /// Expected size; `None` when the server sent no usable Content-Length
    total: Option<u64>,
    downloaded: u64,
    /// Last percentage reported; 0% itself is never reported
    last_percent: u8,
}

impl PercentTracker {
    pub fn new(total: Option<u64>) -> Self {
        Self {
            total: total.filter(|t| *t > 0),
            downloaded: 0,
            last_percent: 0,
        }
    }

    pub fn downloaded(&self) -> u64 {
        self.downloaded
    }

    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Record `bytes` more and return progress if a new percentage was reached
    pub fn advance(&mut self, bytes: u64) -> Option<DownloadProgress> {
        self.downloaded += bytes;
        let total = self.total?;

        let percent = ((self.downloaded.min(total) as u128 * 100) / total as u128) as u8;
        if percent <= self.last_percent {
            return None;
        }
        self.last_percent = percent;

        Some(DownloadProgress {
            percent,
            downloaded_bytes: self.downloaded,
            total_bytes: total,
        })
    }
}

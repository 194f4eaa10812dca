//! Single-flight guard for installs

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Held for the whole duration of one install; releases the flag on drop,
/// whichever way the install ends.
#[derive(Debug)]
pub struct InstallGuard {
    flag: Arc<AtomicBool>,
}

impl InstallGuard {
    /// Take the flag, or `None` if another install holds it
    pub fn try_acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                flag: Arc::clone(flag),
            })
    }
}

impl Drop for InstallGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

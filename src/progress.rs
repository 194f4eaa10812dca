//! Progress events and the fan-out channel that relays them to the UI
//!
//! Delivery is broadcast-only: an event goes to whoever is subscribed at the
//! moment it is emitted. Nothing is buffered for later subscribers.

use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;

/// Pipeline stage an event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Checking,
    Checked,
    Download,
    Downloaded,
    Installing,
    Installed,
    Error,
}

/// One progress notification
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub stage: Stage,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downloaded_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_bytes: Option<u64>,
}

impl ProgressEvent {
    pub fn new(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            percent: None,
            downloaded_bytes: None,
            total_bytes: None,
        }
    }

    pub fn with_percent(mut self, percent: u8) -> Self {
        self.percent = Some(percent.min(100));
        self
    }

    pub fn with_bytes(mut self, downloaded: u64, total: Option<u64>) -> Self {
        self.downloaded_bytes = Some(downloaded);
        self.total_bytes = total;
        self
    }
}

type Callback = Arc<dyn Fn(&ProgressEvent) + Send + Sync>;
type Registry = DashMap<u64, Callback>;

/// Fan-out registry of progress subscribers
#[derive(Clone, Default)]
pub struct ProgressChannel {
    subscribers: Arc<Registry>,
    next_id: Arc<AtomicU64>,
}

impl std::fmt::Debug for ProgressChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressChannel")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl ProgressChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback; it stays registered until the returned
    /// [`Subscription`] is dropped or unsubscribed.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&ProgressEvent) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.insert(id, Arc::new(callback));
        Subscription {
            id,
            registry: Arc::downgrade(&self.subscribers),
        }
    }

    /// Subscribe through an unbounded queue, for async consumers.
    ///
    /// An install emits at most a few hundred events, so the queue is left
    /// unbounded instead of dropping events under a slow reader.
    pub fn subscribe_channel(&self) -> (Subscription, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = self.subscribe(move |event| {
            // Receiver gone means the consumer stopped listening
            let _ = tx.send(event.clone());
        });
        (subscription, rx)
    }

    /// Deliver an event to every current subscriber
    pub fn emit(&self, event: ProgressEvent) {
        tracing::debug!(stage = ?event.stage, percent = ?event.percent, message = %event.message, "Update progress");

        // Snapshot first so a callback may unsubscribe without deadlocking the map
        let callbacks: Vec<Callback> = self
            .subscribers
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        for callback in callbacks {
            callback(&event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

/// Handle returned by [`ProgressChannel::subscribe`]; unsubscribes on drop
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    registry: Weak<Registry>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        // Drop does the work
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(&self.id);
        }
    }
}

//! Cross-tab change channel
//!
//! ```text
//!  tab A ──write──▶ redb ──commit──▶ SyncChannel (broadcast)
//!                                        │
//!                 ┌──────────────────────┼──────────────────────┐
//!                 ▼                      ▼                      ▼
//!          tab A receiver         tab B receiver         tab C receiver
//!          (own origin: drop)     (deliver)              (deliver)
//! ```
//!
//! Every change goes to every tab, the writer included. Each receiver drops
//! changes carrying its own origin.

use super::codec;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio_util::sync::CancellationToken;

/// Default channel capacity
pub const DEFAULT_SYNC_CAPACITY: usize = 256;

/// A committed write, as seen by other tabs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageChange {
    pub key: String,
    /// Stored text after the write; `None` when the key was removed
    pub new_value: Option<String>,
    pub old_value: Option<String>,
    /// Key revision after the write
    pub revision: u64,
    /// Tab that performed the write
    pub origin: String,
    pub timestamp: String,
}

impl StorageChange {
    /// Decode the new value with the same fallback policy as `get_item`
    pub fn new_value_as<T: DeserializeOwned>(&self) -> Option<T> {
        self.new_value
            .as_deref()
            .and_then(|raw| codec::decode_lenient(&self.key, raw))
    }

    pub fn old_value_as<T: DeserializeOwned>(&self) -> Option<T> {
        self.old_value
            .as_deref()
            .and_then(|raw| codec::decode_lenient(&self.key, raw))
    }

    pub fn is_removal(&self) -> bool {
        self.new_value.is_none()
    }
}

/// Broadcast channel shared by every tab of one installation
#[derive(Debug, Clone)]
pub struct SyncChannel {
    tx: broadcast::Sender<Arc<StorageChange>>,
}

impl SyncChannel {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SYNC_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish a change; returns how many receivers got it
    pub fn publish(&self, change: StorageChange) -> usize {
        match self.tx.send(Arc::new(change)) {
            Ok(n) => n,
            Err(_) => {
                // no tab is listening
                0
            }
        }
    }

    /// Receiver for the given tab
    pub fn receiver(&self, origin: impl Into<String>) -> ChangeReceiver {
        ChangeReceiver {
            rx: self.tx.subscribe(),
            origin: origin.into(),
        }
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for SyncChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// One tab's view of the channel, skipping its own writes
#[derive(Debug)]
pub struct ChangeReceiver {
    rx: broadcast::Receiver<Arc<StorageChange>>,
    origin: String,
}

impl ChangeReceiver {
    /// Next foreign change; `None` once the channel is closed
    pub async fn recv(&mut self) -> Option<Arc<StorageChange>> {
        loop {
            match self.rx.recv().await {
                Ok(change) if change.origin == self.origin => continue,
                Ok(change) => return Some(change),
                Err(RecvError::Lagged(n)) => {
                    tracing::warn!(
                        origin = %self.origin,
                        skipped = n,
                        "Sync receiver lagged, changes skipped"
                    );
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next pending foreign change without waiting
    pub fn try_recv(&mut self) -> Option<Arc<StorageChange>> {
        loop {
            match self.rx.try_recv() {
                Ok(change) if change.origin == self.origin => continue,
                Ok(change) => return Some(change),
                Err(TryRecvError::Lagged(n)) => {
                    tracing::warn!(
                        origin = %self.origin,
                        skipped = n,
                        "Sync receiver lagged, changes skipped"
                    );
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }
}

/// Handle to a callback subscription; cancelled on `unsubscribe` or drop
#[derive(Debug)]
pub struct Subscription {
    token: CancellationToken,
}

impl Subscription {
    pub(crate) fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    pub fn unsubscribe(self) {
        self.token.cancel();
    }

    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(origin: &str, key: &str) -> StorageChange {
        StorageChange {
            key: key.to_string(),
            new_value: Some("1".to_string()),
            old_value: None,
            revision: 1,
            origin: origin.to_string(),
            timestamp: shared::util::now_iso(),
        }
    }

    #[test]
    fn test_own_origin_filtered() {
        let channel = SyncChannel::new();
        let mut a = channel.receiver("tab-a");
        let mut b = channel.receiver("tab-b");

        assert_eq!(channel.publish(change("tab-a", "k")), 2);

        assert!(a.try_recv().is_none());
        let got = b.try_recv().unwrap();
        assert_eq!(got.key, "k");
        assert_eq!(got.new_value_as::<u32>(), Some(1));
    }

    #[test]
    fn test_publish_without_receivers() {
        let channel = SyncChannel::new();
        assert_eq!(channel.publish(change("tab-a", "k")), 0);
    }

    #[test]
    fn test_lag_is_skipped() {
        let channel = SyncChannel::with_capacity(2);
        let mut b = channel.receiver("tab-b");
        for i in 0..5 {
            channel.publish(change("tab-a", &format!("k{i}")));
        }
        // oldest entries were overwritten; the newest survive
        let first = b.try_recv().unwrap();
        assert_eq!(first.key, "k3");
        assert_eq!(b.try_recv().unwrap().key, "k4");
        assert!(b.try_recv().is_none());
    }

    #[test]
    fn test_removal_change() {
        let mut c = change("tab-a", "k");
        c.old_value = c.new_value.take();
        assert!(c.is_removal());
        assert_eq!(c.old_value_as::<u32>(), Some(1));
    }

    #[test]
    fn test_subscription_cancel_on_drop() {
        let token = CancellationToken::new();
        let sub = Subscription::new(token.clone());
        assert!(sub.is_active());
        drop(sub);
        assert!(token.is_cancelled());
    }
}

//! In-process event bus
//!
//! ```text
//! repository ──emit()──▶ EventBus
//!                          │
//!                          ├─▶ listeners on Channel::Event(type)   (registration order)
//!                          ├─▶ listeners on Channel::Any           (registration order)
//!                          └─▶ broadcast::Sender  ──▶ async subscribers
//! ```
//!
//! Dispatch is synchronous. A panicking listener is logged and skipped; the
//! remaining listeners still run. Nothing here crosses tabs.

use parking_lot::RwLock;
use shared::event::{EventEnvelope, EventType, StoreEvent};
use std::collections::HashMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;

/// Default capacity of the async broadcast channel
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Listener registration key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Event(EventType),
    /// Wildcard: every event
    Any,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Event(ty) => ty.as_str(),
            Channel::Any => "any",
        }
    }
}

impl From<EventType> for Channel {
    fn from(ty: EventType) -> Self {
        Channel::Event(ty)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle returned by [`EventBus::add_event_listener`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&EventEnvelope) + Send + Sync>;

struct Inner {
    listeners: RwLock<HashMap<Channel, Vec<(ListenerId, Listener)>>>,
    next_id: AtomicU64,
    tx: broadcast::Sender<Arc<EventEnvelope>>,
}

/// Event bus for one tab
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<Inner>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners: usize = self.inner.listeners.read().values().map(Vec::len).sum();
        f.debug_struct("EventBus")
            .field("listeners", &listeners)
            .field("subscribers", &self.inner.tx.receiver_count())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            inner: Arc::new(Inner {
                listeners: RwLock::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                tx,
            }),
        }
    }

    /// Register a listener; listeners on one channel run in registration order
    pub fn add_event_listener<F>(&self, channel: impl Into<Channel>, listener: F) -> ListenerId
    where
        F: Fn(&EventEnvelope) + Send + Sync + 'static,
    {
        let channel = channel.into();
        let id = ListenerId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner
            .listeners
            .write()
            .entry(channel)
            .or_default()
            .push((id, Arc::new(listener)));
        tracing::trace!(channel = %channel, listener = id.0, "Listener added");
        id
    }

    /// Unregister a listener; returns whether it was registered on `channel`
    pub fn remove_event_listener(&self, channel: impl Into<Channel>, id: ListenerId) -> bool {
        let channel = channel.into();
        let mut listeners = self.inner.listeners.write();
        let Some(list) = listeners.get_mut(&channel) else {
            return false;
        };
        let before = list.len();
        list.retain(|(lid, _)| *lid != id);
        let removed = list.len() != before;
        if list.is_empty() {
            listeners.remove(&channel);
        }
        removed
    }

    pub fn listener_count(&self, channel: impl Into<Channel>) -> usize {
        self.inner
            .listeners
            .read()
            .get(&channel.into())
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Async receiver of every emitted envelope
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<EventEnvelope>> {
        self.inner.tx.subscribe()
    }

    /// Deliver `event` to typed listeners, then wildcard listeners, then
    /// async subscribers
    pub fn emit(&self, event: StoreEvent) -> EventEnvelope {
        let envelope = EventEnvelope::new(event);
        let ty = envelope.event_type();

        // Snapshot under the lock, call without it: listeners may (un)register
        let targets: Vec<(ListenerId, Listener)> = {
            let listeners = self.inner.listeners.read();
            [Channel::Event(ty), Channel::Any]
                .iter()
                .filter_map(|channel| listeners.get(channel))
                .flat_map(|list| list.iter().cloned())
                .collect()
        };

        for (id, listener) in targets {
            if let Err(panic_info) = catch_unwind(AssertUnwindSafe(|| listener(&envelope))) {
                let panic_msg: String = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    (*s).to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                tracing::error!(
                    event_type = %ty,
                    listener = id.0,
                    panic = %panic_msg,
                    "Event listener panicked, continuing with remaining listeners"
                );
            }
        }

        // No subscribers is fine
        let _ = self.inner.tx.send(Arc::new(envelope.clone()));
        tracing::debug!(event_type = %ty, "Event emitted");
        envelope
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

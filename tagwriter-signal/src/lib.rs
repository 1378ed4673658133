//! # Tagwriter Signal
//!
//! The bridge between `[action=...]` tags and host behaviour.
//! One process-wide hub; listeners subscribe and receive the tag's raw
//! parameter string. No structure is imposed on the payload.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, RwLock};
use tokio::sync::mpsc;

/// Handle returned by [`ActionHub::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&str) + Send + Sync>;

/// Fan-out point for action notifications.
pub struct ActionHub {
    next_id: AtomicU64,
    listeners: RwLock<BTreeMap<ListenerId, Listener>>,
}

impl std::fmt::Debug for ActionHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionHub")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

static GLOBAL_HUB: OnceLock<Arc<ActionHub>> = OnceLock::new();

impl ActionHub {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            listeners: RwLock::new(BTreeMap::new()),
        }
    }

    /// The process-wide hub. Created on first use.
    pub fn global() -> Arc<ActionHub> {
        GLOBAL_HUB.get_or_init(|| Arc::new(ActionHub::new())).clone()
    }

    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, Arc::new(listener));
        tracing::debug!(?id, "action listener subscribed");
        id
    }

    /// Returns false if the id was not subscribed.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let removed = self
            .listeners
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id)
            .is_some();
        if removed {
            tracing::debug!(?id, "action listener removed");
        }
        removed
    }

    /// Bridge the hub into an async channel. The listener stays subscribed
    /// until unsubscribed; sends to a dropped receiver are ignored.
    pub fn channel(&self) -> (ListenerId, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.subscribe(move |payload| {
            let _ = tx.send(payload.to_string());
        });
        (id, rx)
    }

    /// Fire `payload` at every listener. Returns how many were reached.
    /// Zero listeners is not an error.
    pub fn emit(&self, payload: &str) -> usize {
        // Snapshot first so listeners may (un)subscribe while being called.
        let snapshot: Vec<Listener> = self
            .listeners
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect();

        tracing::debug!(payload, listeners = snapshot.len(), "action emitted");
        for listener in &snapshot {
            listener(payload);
        }
        snapshot.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn clear(&self) {
        self.listeners
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

impl Default for ActionHub {
    fn default() -> Self {
        Self::new()
    }
}

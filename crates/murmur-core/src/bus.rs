//! Process-wide invalidation bus.
//!
//! List views subscribe to learn that some mutation elsewhere (send, delete,
//! archive, rename, membership change) made their conversation summaries
//! stale; they respond by refetching rather than patching piecemeal.
//! Subscription lifetime is tied to the returned guard, matching view
//! mount/unmount.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;

type Callback = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    callbacks: Vec<(u64, Callback)>,
}

#[derive(Clone, Default)]
pub struct InvalidationBus {
    registry: Arc<Mutex<Registry>>,
}

impl InvalidationBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback. Dropping the returned guard (or calling
    /// `unsubscribe`) removes it.
    pub fn subscribe(&self, callback: impl Fn() + Send + Sync + 'static) -> Subscription {
        let mut registry = self.registry.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.callbacks.push((id, Arc::new(callback)));
        Subscription {
            id,
            registry: Arc::clone(&self.registry),
        }
    }

    /// Call every currently subscribed callback synchronously. A panicking
    /// subscriber is logged and skipped so it cannot block the others.
    pub fn publish(&self) {
        // Snapshot outside the lock so a callback may subscribe/publish itself
        let callbacks: Vec<Callback> = self
            .registry
            .lock()
            .callbacks
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();

        for callback in callbacks {
            if catch_unwind(AssertUnwindSafe(|| callback())).is_err() {
                tracing::warn!("invalidation bus: subscriber panicked, skipping");
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.lock().callbacks.len()
    }
}

/// Guard for one subscription; removes the callback when dropped.
pub struct Subscription {
    id: u64,
    registry: Arc<Mutex<Registry>>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        // Drop does the work
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry
            .lock()
            .callbacks
            .retain(|(id, _)| *id != self.id);
    }
}

//! Fan-out of raw shell output to transient listeners.
//!
//! The PTY reader thread publishes every chunk it reads into a [`Broadcaster`].
//! Each in-flight command subscribes for as long as it waits for its sentinel
//! and drops its [`Subscription`] afterwards.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Callback invoked with every output chunk published while it is registered.
pub type Listener = Arc<dyn Fn(&[u8]) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<(u64, Listener)>,
    closed: bool,
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Publish/subscribe hub over one session's output stream.
///
/// Cloning is cheap; clones share the same listener set.
#[derive(Clone, Default)]
pub struct Broadcaster {
    registry: Arc<Mutex<Registry>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for every chunk published from now on.
    ///
    /// On a closed broadcaster nothing is registered and the listener is
    /// dropped right away.
    pub fn subscribe(&self, listener: impl Fn(&[u8]) + Send + Sync + 'static) -> Subscription {
        let mut registry = lock(&self.registry);
        if registry.closed {
            return Subscription {
                id: None,
                registry: Weak::new(),
            };
        }
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.push((id, Arc::new(listener)));
        Subscription {
            id: Some(id),
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Deliver `chunk` to every listener registered at the time of the call.
    ///
    /// The listener set is snapshotted before notifying, so listeners may
    /// subscribe or unsubscribe from inside a callback. Listeners added during
    /// a dispatch only see later chunks.
    pub fn publish(&self, chunk: &[u8]) {
        let snapshot: Vec<Listener> = lock(&self.registry)
            .listeners
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in snapshot {
            listener(chunk);
        }
    }

    /// Drop every listener and refuse new subscriptions.
    pub fn close(&self) {
        let drained = {
            let mut registry = lock(&self.registry);
            registry.closed = true;
            std::mem::take(&mut registry.listeners)
        };
        // Listeners are dropped outside the lock.
        drop(drained);
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.registry).closed
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.registry).listeners.len()
    }
}

/// Handle to one registration on a [`Broadcaster`].
///
/// Unsubscribes when dropped.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: Option<u64>,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Remove this registration. Calling it again is a no-op.
    pub fn unsubscribe(&mut self) {
        let Some(id) = self.id.take() else {
            return;
        };
        if let Some(registry) = self.registry.upgrade() {
            let removed = {
                let mut registry = lock(&registry);
                registry
                    .listeners
                    .iter()
                    .position(|(entry, _)| *entry == id)
                    .map(|idx| registry.listeners.remove(idx))
            };
            drop(removed);
        }
    }

    pub fn is_active(&self) -> bool {
        self.id.is_some() && self.registry.strong_count() > 0
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<u8>>>, impl Fn(&[u8]) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |chunk: &[u8]| {
            sink.lock().unwrap().extend_from_slice(chunk)
        })
    }

    #[test]
    fn test_every_listener_sees_chunks_in_order() {
        let hub = Broadcaster::new();
        let (first, f1) = recorder();
        let (second, f2) = recorder();
        let _s1 = hub.subscribe(f1);
        let _s2 = hub.subscribe(f2);

        hub.publish(b"ab");
        hub.publish(b"cd");

        assert_eq!(&*first.lock().unwrap(), b"abcd");
        assert_eq!(&*second.lock().unwrap(), b"abcd");
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let hub = Broadcaster::new();
        let (seen, f) = recorder();
        let (_, other) = recorder();
        let mut sub = hub.subscribe(f);
        let _keep = hub.subscribe(other);

        hub.publish(b"x");
        sub.unsubscribe();
        sub.unsubscribe();
        hub.publish(b"y");

        assert_eq!(&*seen.lock().unwrap(), b"x");
        assert_eq!(hub.listener_count(), 1);
        assert!(!sub.is_active());
    }

    #[test]
    fn test_drop_unsubscribes() {
        let hub = Broadcaster::new();
        let (_, f) = recorder();
        {
            let _sub = hub.subscribe(f);
            assert_eq!(hub.listener_count(), 1);
        }
        assert_eq!(hub.listener_count(), 0);
    }

    #[test]
    fn test_listener_added_during_dispatch_misses_current_chunk() {
        let hub = Broadcaster::new();
        let (late_seen, late) = recorder();
        let late = Arc::new(late);
        let held = Arc::new(Mutex::new(Vec::new()));

        let hub2 = hub.clone();
        let held2 = held.clone();
        let _outer = hub.subscribe(move |_chunk: &[u8]| {
            let late = late.clone();
            let sub = hub2.subscribe(move |c: &[u8]| (*late)(c));
            held2.lock().unwrap().push(sub);
        });

        hub.publish(b"first");
        assert!(late_seen.lock().unwrap().is_empty());

        hub.publish(b"second");
        assert_eq!(&*late_seen.lock().unwrap(), b"second");
    }

    #[test]
    fn test_close_drops_listeners_and_rejects_new_ones() {
        let hub = Broadcaster::new();
        let (seen, f) = recorder();
        let _sub = hub.subscribe(f);
        hub.close();

        hub.publish(b"after");
        assert!(seen.lock().unwrap().is_empty());
        assert!(hub.is_closed());
        assert_eq!(hub.listener_count(), 0);

        let (_, g) = recorder();
        let late = hub.subscribe(g);
        assert!(!late.is_active());
        assert_eq!(hub.listener_count(), 0);
    }
}

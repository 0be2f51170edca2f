//! Change notifications for the event store.
//!
//! Consumers that mirror the store (a rendered timeline, a cache) register a
//! callback and re-run their fetch when it fires. The returned
//! [`Subscription`] unregisters the callback when dropped, so the
//! subscription lives exactly as long as the component holding it.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Inserted,
    Updated,
    Deleted,
    /// Bulk import; no single event id.
    Imported,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub event_id: Option<String>,
}

type Callback = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    subscribers: Vec<(u64, Callback)>,
}

/// Fan-out of store mutations to live subscribers.
#[derive(Clone, Default)]
pub struct ChangeFeed {
    registry: Arc<Mutex<Registry>>,
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    // The registry is never left half-updated, so a poisoned lock is still usable.
    registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        let mut registry = lock(&self.registry);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.subscribers.push((id, Arc::new(callback)));
        tracing::debug!(subscription = id, "subscriber registered");
        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Deliver `change` to every live subscriber.
    ///
    /// Callbacks run outside the registry lock and may subscribe or drop
    /// subscriptions themselves.
    pub fn notify(&self, change: &ChangeEvent) {
        let callbacks: Vec<Callback> = lock(&self.registry)
            .subscribers
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();
        for callback in callbacks {
            callback(change);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.registry).subscribers.len()
    }
}

impl std::fmt::Debug for ChangeFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeFeed")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Live registration on a [`ChangeFeed`]. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).subscribers.retain(|(id, _)| *id != self.id);
            tracing::debug!(subscription = self.id, "subscriber removed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn inserted(id: &str) -> ChangeEvent {
        ChangeEvent {
            kind: ChangeKind::Inserted,
            event_id: Some(id.to_string()),
        }
    }

    #[test]
    fn subscribers_receive_changes_until_dropped() {
        let feed = ChangeFeed::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let sub = feed.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        feed.notify(&inserted("a"));
        feed.notify(&inserted("b"));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(feed.subscriber_count(), 1);

        drop(sub);
        feed.notify(&inserted("c"));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[test]
    fn subscription_outliving_feed_drops_cleanly() {
        let feed = ChangeFeed::new();
        let sub = feed.subscribe(|_| {});
        drop(feed);
        drop(sub);
    }

    #[test]
    fn callbacks_see_the_change_payload() {
        let feed = ChangeFeed::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = feed.subscribe(move |change| {
            sink.lock().unwrap().push(change.clone());
        });

        feed.notify(&ChangeEvent {
            kind: ChangeKind::Deleted,
            event_id: Some("x".into()),
        });
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].kind, ChangeKind::Deleted);
    }

    #[test]
    fn subscription_ids_are_unique() {
        let feed = ChangeFeed::new();
        let a = feed.subscribe(|_| {});
        let b = feed.subscribe(|_| {});
        assert_ne!(a.id(), b.id());
    }
}

//! Connection registry
//!
//! The set of live subscribers a broadcast reaches. Membership is keyed by
//! [`SubscriberId`], so a subscriber can be present at most once. Every
//! operation takes the lock for the map operation alone; broadcasts work on
//! a copied snapshot and never hold the lock across I/O.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;
use types::errors::DeliveryError;
use types::ids::SubscriberId;

use crate::metrics::FeedMetrics;
use crate::sync::lock;

/// A live connection that can take serialized feed messages.
#[async_trait]
pub trait Subscriber: Send + Sync {
    /// Identity of this connection.
    fn id(&self) -> SubscriberId;

    /// Best-effort push of one serialized JSON message.
    ///
    /// Must not wait on a slow peer; any failure means "not delivered".
    async fn send_json(&self, json: Arc<str>) -> Result<(), DeliveryError>;
}

/// Thread-safe set of active subscribers.
pub struct ConnectionRegistry {
    members: Mutex<HashMap<SubscriberId, Arc<dyn Subscriber>>>,
    metrics: Arc<FeedMetrics>,
}

impl ConnectionRegistry {
    pub fn new(metrics: Arc<FeedMetrics>) -> Self {
        Self {
            members: Mutex::new(HashMap::new()),
            metrics,
        }
    }

    /// Insert a subscriber. Returns false if its id is already present.
    pub fn add(&self, subscriber: Arc<dyn Subscriber>) -> bool {
        let id = subscriber.id();
        let inserted = {
            let mut members = lock(&self.members);
            if members.contains_key(&id) {
                false
            } else {
                members.insert(id, subscriber);
                true
            }
        };
        if inserted {
            self.metrics.record_registered();
            debug!(subscriber_id = %id, "Subscriber added");
        }
        inserted
    }

    /// Remove a subscriber if present. Removing a non-member is a no-op.
    pub fn remove(&self, id: &SubscriberId) -> bool {
        let removed = lock(&self.members).remove(id).is_some();
        if removed {
            self.metrics.record_removed();
            debug!(subscriber_id = %id, "Subscriber removed");
        }
        removed
    }

    /// Independent copy of the current membership.
    pub fn snapshot(&self) -> Vec<Arc<dyn Subscriber>> {
        lock(&self.members).values().cloned().collect()
    }

    pub fn contains(&self, id: &SubscriberId) -> bool {
        lock(&self.members).contains_key(id)
    }

    /// Number of registered subscribers.
    pub fn len(&self) -> usize {
        lock(&self.members).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add a subscriber and tie its membership to the returned guard.
    ///
    /// Returns `None` if the id is already registered; the existing guard
    /// stays the only owner of that membership.
    pub fn register(self: &Arc<Self>, subscriber: Arc<dyn Subscriber>) -> Option<Registration> {
        let id = subscriber.id();
        self.add(subscriber).then(|| Registration {
            registry: Arc::clone(self),
            id,
        })
    }

    /// Ids of the current members.
    pub fn ids(&self) -> Vec<SubscriberId> {
        lock(&self.members).keys().copied().collect()
    }
}

/// Registry membership of one connection.
///
/// Dropping the guard removes the subscriber, so every exit path of a
/// connection task (close, error, cancellation, panic) releases it.
#[must_use = "dropping the registration unregisters the subscriber"]
pub struct Registration {
    registry: Arc<ConnectionRegistry>,
    id: SubscriberId,
}

impl Registration {
    pub fn id(&self) -> SubscriberId {
        self.id
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration").field("id", &self.id).finish()
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.registry.remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    struct NullSubscriber(SubscriberId);

    #[async_trait]
    impl Subscriber for NullSubscriber {
        fn id(&self) -> SubscriberId {
            self.0
        }

        async fn send_json(&self, _json: Arc<str>) -> Result<(), DeliveryError> {
            Ok(())
        }
    }

    fn subscriber() -> Arc<dyn Subscriber> {
        Arc::new(NullSubscriber(SubscriberId::new()))
    }

    fn registry() -> Arc<ConnectionRegistry> {
        Arc::new(ConnectionRegistry::new(Arc::new(FeedMetrics::new())))
    }

    #[test]
    fn test_add_and_remove() {
        let reg = registry();
        let sub = subscriber();
        let id = sub.id();

        assert!(reg.add(sub));
        assert!(reg.contains(&id));
        assert_eq!(reg.len(), 1);

        assert!(reg.remove(&id));
        assert!(reg.is_empty());
    }

    #[test]
    fn test_duplicate_add_is_ignored() {
        let reg = registry();
        let sub = subscriber();

        assert!(reg.add(Arc::clone(&sub)));
        assert!(!reg.add(sub));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_remove_non_member_is_noop() {
        let reg = registry();
        reg.add(subscriber());

        assert!(!reg.remove(&SubscriberId::new()));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_snapshot_is_independent() {
        let reg = registry();
        let sub = subscriber();
        let id = sub.id();
        reg.add(sub);

        let snapshot = reg.snapshot();
        reg.remove(&id);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id(), id);
        assert!(reg.snapshot().is_empty());
    }

    #[test]
    fn test_registration_drop_unregisters() {
        let reg = registry();
        let registration = reg.register(subscriber()).unwrap();
        let id = registration.id();
        assert!(reg.contains(&id));

        drop(registration);
        assert!(!reg.contains(&id));
    }

    #[test]
    fn test_explicit_remove_then_drop() {
        let reg = registry();
        let registration = reg.register(subscriber()).unwrap();
        assert!(reg.remove(&registration.id()));
        drop(registration);
        assert!(reg.is_empty());
    }

    #[test]
    fn test_duplicate_register_yields_no_second_guard() {
        let reg = registry();
        let sub = subscriber();
        let id = sub.id();

        let first = reg.register(Arc::clone(&sub)).unwrap();
        assert!(reg.register(sub).is_none());
        assert!(reg.contains(&id));
        assert_eq!(reg.ids(), vec![id]);

        drop(first);
        assert!(!reg.contains(&id));
    }

    #[test]
    fn test_reregister_after_drop() {
        let reg = registry();
        let sub = subscriber();

        drop(reg.register(Arc::clone(&sub)).unwrap());
        let again = reg.register(sub).unwrap();
        assert!(reg.contains(&again.id()));
    }

    #[test]
    fn test_concurrent_membership() {
        let reg = registry();

        // Each thread adds 200 subscribers and removes every other one.
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let reg = Arc::clone(&reg);
                thread::spawn(move || {
                    let mut kept = Vec::new();
                    for i in 0..200 {
                        let sub = subscriber();
                        let id = sub.id();
                        assert!(reg.add(sub));
                        if i % 2 == 0 {
                            assert!(reg.remove(&id));
                        } else {
                            kept.push(id);
                        }
                    }
                    kept
                })
            })
            .collect();

        let kept: Vec<SubscriberId> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();

        assert_eq!(kept.len(), 800);
        assert_eq!(reg.len(), 800);
        assert!(kept.iter().all(|id| reg.contains(id)));
    }
}

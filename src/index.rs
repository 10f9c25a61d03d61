// ABOUTME: Process-wide topic -> subscriber-set mapping with non-owning references
// ABOUTME: Single lock guards the map; snapshots are taken under the lock and iterated outside it

use crate::session::SessionHandle;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use tracing::debug;

/// Maps topic ids to the set of sessions currently subscribed to them.
///
/// References held here are [`Weak`]: the index never keeps a session's
/// handle alive. Ownership of a session rests with the task that accepted
/// it; once that task drops its `Arc<SessionHandle>`, the weak references
/// here simply stop upgrading.
#[derive(Default)]
pub struct SubscriptionIndex {
    topics: Mutex<HashMap<i32, Vec<Weak<SessionHandle>>>>,
}

impl SubscriptionIndex {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Idempotent insert: if a live reference to `session` already exists
    /// under `topic`, this is a no-op.
    pub fn subscribe(&self, topic: i32, session: &Arc<SessionHandle>) {
        let mut topics = self.topics.lock().unwrap();
        let bucket = topics.entry(topic).or_default();
        let already_present = bucket
            .iter()
            .any(|weak| weak.upgrade().is_some_and(|s| Arc::ptr_eq(&s, session)));
        if !already_present {
            bucket.push(Arc::downgrade(session));
        }
    }

    /// Remove any reference to `session` under `topic`, purging any expired
    /// references encountered along the way. Removes the topic key entirely
    /// if the resulting set is empty.
    pub fn unsubscribe(&self, topic: i32, session: &Arc<SessionHandle>) {
        let mut topics = self.topics.lock().unwrap();
        if let Some(bucket) = topics.get_mut(&topic) {
            bucket.retain(|weak| match weak.upgrade() {
                Some(s) => !Arc::ptr_eq(&s, session),
                None => false,
            });
            if bucket.is_empty() {
                topics.remove(&topic);
            }
        }
    }

    /// Remove `session` from every topic it is subscribed to, purging any
    /// expired references encountered along the way.
    pub fn unsubscribe_all(&self, session: &Arc<SessionHandle>) {
        let mut topics = self.topics.lock().unwrap();
        topics.retain(|_, bucket| {
            bucket.retain(|weak| match weak.upgrade() {
                Some(s) => !Arc::ptr_eq(&s, session),
                None => false,
            });
            !bucket.is_empty()
        });
    }

    /// Return a materialized snapshot of the currently-live subscribers of
    /// `topic`. The snapshot is computed under the lock and returned after
    /// it is released; callers must not hold the index lock while iterating
    /// the result and calling `deliver_raw` on it.
    pub fn subscribers(&self, topic: i32) -> Vec<Arc<SessionHandle>> {
        let topics = self.topics.lock().unwrap();
        match topics.get(&topic) {
            Some(bucket) => bucket.iter().filter_map(Weak::upgrade).collect(),
            None => Vec::new(),
        }
    }

    /// Sweep every topic, dropping expired references and removing any
    /// topic whose set becomes empty. Logs the number of expired references
    /// removed, if any.
    pub fn cleanup_dead(&self) {
        let mut topics = self.topics.lock().unwrap();
        let mut removed = 0usize;
        topics.retain(|_, bucket| {
            let before = bucket.len();
            bucket.retain(|weak| weak.upgrade().is_some());
            removed += before - bucket.len();
            !bucket.is_empty()
        });
        drop(topics);
        if removed > 0 {
            debug!(removed, "cleanup_dead removed expired subscriber references");
        }
    }
}

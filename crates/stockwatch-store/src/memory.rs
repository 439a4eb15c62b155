//! In-memory state shared between the monitor loop and readers.
//!
//! Both structures serialize mutation behind a `parking_lot` lock. Readers get
//! an owned copy taken under the lock, so they never observe a half-applied
//! update and never hold the lock longer than the copy.

use parking_lot::{Mutex, RwLock};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use stockwatch_core::models::NotificationEvent;

use crate::ports::NotificationFeed;

pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 200;
pub const DEFAULT_PROCESSED_CAPACITY: usize = 5000;

/// Bounded, newest-first notification feed
#[derive(Debug, Clone)]
pub struct MemoryNotificationStore {
    events: Arc<RwLock<VecDeque<NotificationEvent>>>,
    capacity: usize,
}

impl MemoryNotificationStore {
    /// Create a feed holding at most `capacity` events (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for MemoryNotificationStore {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_CAPACITY)
    }
}

impl NotificationFeed for MemoryNotificationStore {
    fn push_front(&self, event: NotificationEvent) {
        let mut events = self.events.write();
        events.push_front(event);
        events.truncate(self.capacity);
    }

    fn snapshot(&self) -> Vec<NotificationEvent> {
        self.events.read().iter().cloned().collect()
    }

    fn len(&self) -> usize {
        self.events.read().len()
    }
}

#[derive(Debug, Default)]
struct SeenEntries {
    members: HashSet<String>,
    order: VecDeque<String>,
}

/// Defect images already turned into notifications.
///
/// Bounded FIFO: when full, the identifier seen longest ago is evicted, one at
/// a time, so de-duplication keeps holding for everything more recent. The set
/// is a cache of what the defect directory holds; [`ProcessedSet::retain`]
/// drops identifiers whose files are gone, and
/// [`ProcessedSet::insert_keeping`] never evicts an identifier that is still
/// present, growing past the capacity instead.
#[derive(Debug, Clone)]
pub struct ProcessedSet {
    inner: Arc<Mutex<SeenEntries>>,
    capacity: usize,
}

impl ProcessedSet {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SeenEntries::default())),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.lock().members.contains(id)
    }

    /// Record `id`. Returns `false` if it was already present.
    pub fn insert(&self, id: &str) -> bool {
        self.insert_keeping(id, |_| false)
    }

    /// Record `id`, evicting the oldest identifiers for which `still_present`
    /// is false. When every entry is still present the set grows past its
    /// capacity rather than forget a live identifier.
    pub fn insert_keeping<F>(&self, id: &str, still_present: F) -> bool
    where
        F: Fn(&str) -> bool,
    {
        let mut seen = self.inner.lock();
        if seen.members.contains(id) {
            return false;
        }

        seen.members.insert(id.to_string());
        seen.order.push_back(id.to_string());

        while seen.order.len() > self.capacity {
            let Some(pos) = seen
                .order
                .iter()
                .position(|entry| entry != id && !still_present(entry))
            else {
                if seen.order.len() == self.capacity + 1 {
                    tracing::warn!(
                        capacity = self.capacity,
                        "Processed set over capacity, every entry is still on disk"
                    );
                }
                break;
            };

            if let Some(evicted) = seen.order.remove(pos) {
                seen.members.remove(&evicted);
                tracing::warn!(
                    evicted = %evicted,
                    capacity = self.capacity,
                    "Processed set full, evicting oldest entry"
                );
            }
        }
        true
    }

    /// Keep only identifiers for which `keep` returns true
    pub fn retain<F>(&self, mut keep: F) -> usize
    where
        F: FnMut(&str) -> bool,
    {
        let mut seen = self.inner.lock();
        let before = seen.order.len();
        let SeenEntries { members, order } = &mut *seen;
        order.retain(|id| {
            let kept = keep(id);
            if !kept {
                members.remove(id);
            }
            kept
        });
        before - seen.order.len()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ProcessedSet {
    fn default() -> Self {
        Self::new(DEFAULT_PROCESSED_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::thread;
    use stockwatch_core::models::{AreaMatch, PixelPoint, WorldPoint};

    fn event(image: &str) -> NotificationEvent {
        NotificationEvent::new(
            Utc::now(),
            AreaMatch::Unclassified,
            WorldPoint::default(),
            PixelPoint::default(),
            image,
        )
    }

    #[test]
    fn test_newest_first() {
        let store = MemoryNotificationStore::new(10);
        store.push_front(event("a"));
        store.push_front(event("b"));

        let snapshot = store.snapshot();
        assert_eq!(snapshot[0].image, "b");
        assert_eq!(snapshot[1].image, "a");
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let store = MemoryNotificationStore::new(200);
        for i in 0..201 {
            store.push_front(event(&format!("defect_{i}.jpg")));
        }

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 200);
        assert_eq!(snapshot[0].image, "defect_200.jpg");
        assert_eq!(snapshot[199].image, "defect_1.jpg");
        assert!(!snapshot.iter().any(|e| e.image == "defect_0.jpg"));
    }

    #[test]
    fn test_snapshot_is_detached() {
        let store = MemoryNotificationStore::new(5);
        store.push_front(event("a"));
        let snapshot = store.snapshot();
        store.push_front(event("b"));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_concurrent_writers_and_readers() {
        let store = MemoryNotificationStore::new(50);
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let store = store.clone();
                thread::spawn(move || {
                    for i in 0..100 {
                        store.push_front(event(&format!("{t}-{i}")));
                        assert!(store.snapshot().len() <= 50);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.len(), 50);
    }

    #[test]
    fn test_processed_insert_is_idempotent() {
        let set = ProcessedSet::new(10);
        assert!(set.insert("defect_1.jpg"));
        assert!(!set.insert("defect_1.jpg"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_processed_evicts_fifo() {
        let set = ProcessedSet::new(3);
        for name in ["a", "b", "c", "d"] {
            set.insert(name);
        }
        assert_eq!(set.len(), 3);
        assert!(!set.contains("a"));
        assert!(set.contains("b"));
        assert!(set.contains("d"));

        // Re-inserting an existing id does not refresh or evict
        assert!(!set.insert("b"));
        assert!(set.contains("c"));
    }

    #[test]
    fn test_processed_keeps_present_entries() {
        let set = ProcessedSet::new(2);
        let on_disk = ["a", "b", "c"];
        for name in on_disk {
            set.insert_keeping(name, |id| on_disk.contains(&id));
        }
        assert_eq!(set.len(), 3);
        assert!(on_disk.iter().all(|id| set.contains(id)));

        // Once "a" is gone from disk it is the one evicted
        set.insert_keeping("d", |id| id != "a");
        assert!(!set.contains("a"));
        assert!(set.contains("b"));
        assert!(set.contains("d"));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_processed_retain() {
        let set = ProcessedSet::new(10);
        for name in ["a", "b", "c"] {
            set.insert(name);
        }
        let removed = set.retain(|id| id != "b");
        assert_eq!(removed, 1);
        assert!(!set.contains("b"));
        assert!(set.insert("b"));
    }

    #[test]
    fn test_zero_capacity_clamped() {
        assert_eq!(MemoryNotificationStore::new(0).capacity(), 1);
        assert_eq!(ProcessedSet::new(0).capacity(), 1);
    }
}

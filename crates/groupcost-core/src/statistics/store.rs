//! Statistics lookup and copy-on-write refresh.

use std::sync::Arc;

use super::IndexStatistics;
use groupcost_common::IndexId;
use hashbrown::HashMap;
use parking_lot::RwLock;

/// Source of per-index statistics.
///
/// Returning `None` is a normal outcome: estimators fall back to default
/// selectivities when an index has not been analyzed.
pub trait StatisticsSource: Send + Sync {
    /// Statistics for `index`, if analyzed.
    fn index_statistics(&self, index: IndexId) -> Option<Arc<IndexStatistics>>;
}

/// An immutable set of index statistics.
#[derive(Debug, Clone, Default)]
pub struct StatisticsSnapshot {
    indexes: HashMap<IndexId, Arc<IndexStatistics>>,
}

impl StatisticsSnapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds statistics, replacing any earlier entry for the same index.
    #[must_use]
    pub fn with(mut self, statistics: IndexStatistics) -> Self {
        self.insert(statistics);
        self
    }

    pub(crate) fn insert(&mut self, statistics: IndexStatistics) {
        self.indexes
            .insert(statistics.index(), Arc::new(statistics));
    }

    /// Statistics for `index`.
    #[must_use]
    pub fn get(&self, index: IndexId) -> Option<&Arc<IndexStatistics>> {
        self.indexes.get(&index)
    }

    /// Number of analyzed indexes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    /// Returns true if no index has statistics.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    /// Iterates over all statistics in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<IndexStatistics>> {
        self.indexes.values()
    }
}

impl StatisticsSource for StatisticsSnapshot {
    fn index_statistics(&self, index: IndexId) -> Option<Arc<IndexStatistics>> {
        self.indexes.get(&index).cloned()
    }
}

/// Holds the current statistics snapshot and swaps it on refresh.
///
/// Readers take an `Arc` to the snapshot current at the time of the call
/// and keep seeing it however many refreshes happen afterwards.
#[derive(Debug, Default)]
pub struct StatisticsStore {
    current: RwLock<Arc<StatisticsSnapshot>>,
}

impl StatisticsStore {
    /// Creates a store holding an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `snapshot`.
    #[must_use]
    pub fn with_snapshot(snapshot: StatisticsSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// The current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<StatisticsSnapshot> {
        Arc::clone(&self.current.read())
    }

    /// Replaces the whole snapshot.
    pub fn replace(&self, snapshot: StatisticsSnapshot) {
        *self.current.write() = Arc::new(snapshot);
        tracing::debug!("statistics snapshot replaced");
    }

    /// Publishes a new snapshot with `statistics` added or replaced.
    pub fn update(&self, statistics: IndexStatistics) {
        let index = statistics.index();
        let mut current = self.current.write();
        let mut next = StatisticsSnapshot::clone(&current);
        next.insert(statistics);
        *current = Arc::new(next);
        tracing::debug!(index = %index, "index statistics updated");
    }

    /// Publishes a new snapshot without statistics for `index`. Returns
    /// false if there were none.
    pub fn remove(&self, index: IndexId) -> bool {
        let mut current = self.current.write();
        if !current.indexes.contains_key(&index) {
            return false;
        }
        let mut next = StatisticsSnapshot::clone(&current);
        next.indexes.remove(&index);
        *current = Arc::new(next);
        tracing::debug!(index = %index, "index statistics removed");
        true
    }
}

impl StatisticsSource for StatisticsStore {
    fn index_statistics(&self, index: IndexId) -> Option<Arc<IndexStatistics>> {
        self.current.read().index_statistics(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_snapshot_lookup() {
        let snapshot = StatisticsSnapshot::new()
            .with(IndexStatistics::new(IndexId::new(0), 10, 10))
            .with(IndexStatistics::new(IndexId::new(1), 20, 5));
        assert_eq!(snapshot.len(), 2);
        assert_eq!(
            snapshot.index_statistics(IndexId::new(1)).unwrap().sampled_count(),
            5
        );
        assert!(snapshot.index_statistics(IndexId::new(9)).is_none());
    }

    #[test]
    fn test_readers_keep_their_snapshot() {
        let store = StatisticsStore::new();
        store.update(IndexStatistics::new(IndexId::new(0), 10, 10));
        let before = store.snapshot();

        store.update(IndexStatistics::new(IndexId::new(0), 99, 99));
        assert_eq!(before.get(IndexId::new(0)).unwrap().row_count(), 10);
        assert_eq!(
            store.index_statistics(IndexId::new(0)).unwrap().row_count(),
            99
        );
    }

    #[test]
    fn test_replace_and_remove() {
        let store = StatisticsStore::with_snapshot(
            StatisticsSnapshot::new().with(IndexStatistics::new(IndexId::new(3), 1, 1)),
        );
        assert!(store.remove(IndexId::new(3)));
        assert!(!store.remove(IndexId::new(3)));
        assert!(store.snapshot().is_empty());

        store.replace(StatisticsSnapshot::new().with(IndexStatistics::new(IndexId::new(4), 1, 1)));
        assert!(store.index_statistics(IndexId::new(4)).is_some());
    }

    #[test]
    fn test_concurrent_readers_and_writer() {
        let store = Arc::new(StatisticsStore::new());
        let handles: Vec<_> = (0..4u32)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for n in 0..100u64 {
                        store.update(IndexStatistics::new(IndexId::new(i), n, n));
                        let snapshot = store.snapshot();
                        assert!(snapshot.get(IndexId::new(i)).is_some());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.snapshot().len(), 4);
    }
}

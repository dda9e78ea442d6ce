use super::{load_json, persist_json};
use crate::models::Stats;
use crate::storage::{StoreHandle, keys};
use std::sync::{Arc, Mutex};

/// Usage counters, persisted synchronously on every change.
///
/// Clones share the same in-memory record.
#[derive(Clone)]
pub struct StatsStore {
    store: StoreHandle,
    stats: Arc<Mutex<Stats>>,
}

impl StatsStore {
    /// Create the store, loading any persisted counters.
    pub fn new(store: StoreHandle) -> Self {
        let stats = load_json(store.as_ref(), keys::STATS).unwrap_or_default();
        Self {
            store,
            stats: Arc::new(Mutex::new(stats)),
        }
    }

    pub fn snapshot(&self) -> Stats {
        *self.stats.lock().unwrap()
    }

    pub fn increment_generated(&self) -> Stats {
        self.mutate(|s| s.total_generated += 1)
    }

    pub fn increment_downloaded(&self) -> Stats {
        self.mutate(|s| s.total_downloaded += 1)
    }

    pub fn set_history_count(&self, count: usize) -> Stats {
        self.mutate(|s| s.history_count = count)
    }

    /// Zero the totals. `history_count` keeps mirroring the history store.
    pub fn reset(&self) -> Stats {
        self.mutate(|s| {
            s.total_generated = 0;
            s.total_downloaded = 0;
        })
    }

    fn mutate<F>(&self, f: F) -> Stats
    where
        F: FnOnce(&mut Stats),
    {
        let mut stats = self.stats.lock().unwrap();
        f(&mut stats);
        persist_json(self.store.as_ref(), keys::STATS, &*stats);
        *stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_counters_start_at_zero() {
        let store = StatsStore::new(Arc::new(MemoryStore::new()));
        assert_eq!(store.snapshot(), Stats::default());
    }

    #[test]
    fn test_increment_generated_survives_reload() {
        let backend: StoreHandle = Arc::new(MemoryStore::new());
        let store = StatsStore::new(backend.clone());

        for _ in 0..5 {
            store.increment_generated();
        }

        let reloaded = StatsStore::new(backend);
        assert_eq!(reloaded.snapshot().total_generated, 5);
    }

    #[test]
    fn test_reset_keeps_history_count() {
        let store = StatsStore::new(Arc::new(MemoryStore::new()));
        store.increment_generated();
        store.increment_downloaded();
        store.set_history_count(3);

        let stats = store.reset();
        assert_eq!(stats.total_generated, 0);
        assert_eq!(stats.total_downloaded, 0);
        assert_eq!(stats.history_count, 3);
    }

    #[test]
    fn test_failed_persist_keeps_in_memory_value() {
        let store = StatsStore::new(Arc::new(MemoryStore::with_quota(0)));
        let stats = store.increment_generated();
        assert_eq!(stats.total_generated, 1);
        assert_eq!(store.snapshot().total_generated, 1);
    }

    #[test]
    fn test_clones_share_counters() {
        let store = StatsStore::new(Arc::new(MemoryStore::new()));
        let clone = store.clone();
        clone.increment_downloaded();
        assert_eq!(store.snapshot().total_downloaded, 1);
    }
}

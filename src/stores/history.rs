use super::stats::StatsStore;
use super::{load_json, persist_json};
use crate::models::config::DEFAULT_HISTORY_CAPACITY;
use crate::models::{HistoryEntry, ImageFormat};
use crate::storage::{StoreHandle, keys};
use chrono::Utc;
use std::sync::{Arc, Mutex};

/// Bounded most-recent-first history, deduplicated by text.
///
/// Adding a text that is already present removes the old entry and inserts
/// the new one at the front ("touch" semantics), so repeated generations of
/// the same text collapse into one entry carrying the latest timestamp.
/// Every change reports the new entry count to the [`StatsStore`].
#[derive(Clone)]
pub struct HistoryStore {
    store: StoreHandle,
    stats: StatsStore,
    capacity: usize,
    /// Serializes read-modify-write cycles within the process
    write_lock: Arc<Mutex<()>>,
}

impl HistoryStore {
    pub fn new(store: StoreHandle, stats: StatsStore) -> Self {
        Self::with_capacity(store, stats, DEFAULT_HISTORY_CAPACITY)
    }

    /// Create a store keeping at most `capacity` entries (minimum 1).
    pub fn with_capacity(store: StoreHandle, stats: StatsStore, capacity: usize) -> Self {
        Self {
            store,
            stats,
            capacity: capacity.max(1),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// All entries, most recent first.
    pub fn list(&self) -> Vec<HistoryEntry> {
        load_json(self.store.as_ref(), keys::HISTORY).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.list().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: u64) -> Option<HistoryEntry> {
        self.list().into_iter().find(|e| e.id == id)
    }

    /// Record a generation at the front of the history.
    ///
    /// # Arguments
    /// * `text` - Encoded text; an existing entry with the same text is replaced
    /// * `image` - Exported image as a data URL
    /// * `format` - Format of `image`
    /// * `size` - Symbol size in pixels
    ///
    /// # Returns
    /// The inserted entry
    pub fn add(&self, text: &str, image: String, format: ImageFormat, size: u32) -> HistoryEntry {
        let _guard = self.write_lock.lock().unwrap();
        let mut entries = self.list();

        let before = entries.len();
        entries.retain(|e| e.text != text);
        if entries.len() != before {
            tracing::debug!("Replacing existing history entry for {:?}", text);
        }

        let entry = HistoryEntry {
            id: Self::next_id(&entries),
            text: text.to_string(),
            image,
            format,
            size,
            timestamp: Utc::now(),
        };
        entries.insert(0, entry.clone());

        if entries.len() > self.capacity {
            let evicted = entries.len() - self.capacity;
            entries.truncate(self.capacity);
            tracing::debug!("Evicted {} oldest history entries", evicted);
        }

        self.commit(&entries);
        entry
    }

    /// Delete a single entry.
    ///
    /// # Returns
    /// `true` if an entry with `id` existed
    pub fn remove(&self, id: u64) -> bool {
        let _guard = self.write_lock.lock().unwrap();
        let mut entries = self.list();

        let before = entries.len();
        entries.retain(|e| e.id != id);
        if entries.len() == before {
            return false;
        }

        self.commit(&entries);
        true
    }

    /// Empty the history.
    pub fn clear(&self) {
        let _guard = self.write_lock.lock().unwrap();

        if let Err(e) = self.store.remove(keys::HISTORY) {
            tracing::warn!("Failed to clear persisted history: {}", e);
            // Fall back to overwriting with an empty list
            persist_json(self.store.as_ref(), keys::HISTORY, &Vec::<HistoryEntry>::new());
        }

        self.stats.set_history_count(self.list().len());
        tracing::info!("History cleared");
    }

    /// Persist `entries`; the count reported to stats is whatever actually got stored.
    fn commit(&self, entries: &[HistoryEntry]) {
        let count = if persist_json(self.store.as_ref(), keys::HISTORY, &entries) {
            entries.len()
        } else {
            self.list().len()
        };
        self.stats.set_history_count(count);
    }

    /// Epoch milliseconds, bumped past every existing id.
    fn next_id(entries: &[HistoryEntry]) -> u64 {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
        let newest = entries.iter().map(|e| e.id).max().unwrap_or(0);
        now.max(newest + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn create_store(capacity: usize) -> (HistoryStore, StatsStore) {
        let backend: StoreHandle = Arc::new(MemoryStore::new());
        let stats = StatsStore::new(backend.clone());
        let history = HistoryStore::with_capacity(backend, stats.clone(), capacity);
        (history, stats)
    }

    fn add(history: &HistoryStore, text: &str) -> HistoryEntry {
        history.add(text, format!("data:image/png;base64,{}", text), ImageFormat::Png, 200)
    }

    #[test]
    fn test_add_inserts_at_front() {
        let (history, stats) = create_store(10);

        add(&history, "first");
        add(&history, "second");

        let entries = history.list();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].text, "second");
        assert_eq!(entries[1].text, "first");
        assert_eq!(stats.snapshot().history_count, 2);
    }

    #[test]
    fn test_duplicate_text_moves_to_front() {
        let (history, stats) = create_store(10);

        let old = add(&history, "a");
        add(&history, "b");
        let new = add(&history, "a");

        let entries = history.list();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].text, "a");
        assert_eq!(entries[0].id, new.id);
        assert!(new.id > old.id);
        assert!(new.timestamp >= old.timestamp);
        assert_eq!(entries[1].text, "b");
        assert_eq!(stats.snapshot().history_count, 2);
    }

    #[test]
    fn test_dedup_is_case_sensitive() {
        let (history, _stats) = create_store(10);
        add(&history, "Hello");
        add(&history, "hello");
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let (history, stats) = create_store(3);

        for text in ["1", "2", "3", "4"] {
            add(&history, text);
        }

        let texts: Vec<String> = history.list().into_iter().map(|e| e.text).collect();
        assert_eq!(texts, vec!["4", "3", "2"]);
        assert_eq!(stats.snapshot().history_count, 3);
    }

    #[test]
    fn test_ids_unique_and_increasing() {
        let (history, _stats) = create_store(10);
        let ids: Vec<u64> = (0..5).map(|i| add(&history, &i.to_string()).id).collect();
        for pair in ids.windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }

    #[test]
    fn test_get_and_remove() {
        let (history, stats) = create_store(10);
        let a = add(&history, "a");
        add(&history, "b");

        assert_eq!(history.get(a.id).unwrap().text, "a");
        assert!(history.remove(a.id));
        assert!(!history.remove(a.id));
        assert!(history.get(a.id).is_none());
        assert_eq!(stats.snapshot().history_count, 1);
    }

    #[test]
    fn test_clear() {
        let (history, stats) = create_store(10);
        add(&history, "a");
        add(&history, "b");

        history.clear();

        assert!(history.is_empty());
        assert_eq!(stats.snapshot().history_count, 0);
    }

    #[test]
    fn test_rejected_write_keeps_count_in_sync() {
        let backend: StoreHandle = Arc::new(MemoryStore::with_quota(400));
        let stats = StatsStore::new(backend.clone());
        let history = HistoryStore::new(backend, stats.clone());

        add(&history, "a");
        assert_eq!(history.len(), 1);

        // The second list no longer fits, so the stored one stays as it was
        add(&history, &"b".repeat(300));
        assert_eq!(history.len(), 1);
        assert_eq!(stats.snapshot().history_count, history.len());
    }

    #[test]
    fn test_minimum_capacity_is_one() {
        let (history, _stats) = create_store(0);
        assert_eq!(history.capacity(), 1);
        add(&history, "a");
        add(&history, "b");
        assert_eq!(history.len(), 1);
    }
}

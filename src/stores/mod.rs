//! Typed stores over the key-value layer.
//!
//! Each store owns one key of the persisted layout and an explicit
//! [`StoreHandle`](crate::storage::StoreHandle); there is no global state.
//!
//! - [`SettingsStore`]: generation preferences, merged over defaults on load
//! - [`StatsStore`]: usage counters, persisted on every change
//! - [`HistoryStore`]: bounded, deduplicated, most-recent-first history
//! - [`PreferenceStore`]: theme and language enum values
//!
//! Write failures are never propagated from here: the in-memory value stays
//! authoritative for the running process and the failure is logged.

pub mod history;
pub mod preferences;
pub mod settings;
pub mod stats;

pub use history::HistoryStore;
pub use preferences::{LanguageStore, PreferenceStore, ThemeStore};
pub use settings::SettingsStore;
pub use stats::StatsStore;

use crate::storage::KeyValueStore;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Read and decode the JSON record under `key`.
///
/// Absent keys and undecodable records both yield `None`; the latter is logged.
pub(crate) fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = store.get(key)?;

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Discarding unreadable {} record: {}", key, e);
            None
        }
    }
}

/// Encode and write `value` under `key`.
///
/// # Returns
/// `true` if the record was persisted, `false` if persistence was skipped
pub(crate) fn persist_json<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) -> bool {
    let json = match serde_json::to_string(value) {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!("Failed to serialize {} record, persistence skipped: {}", key, e);
            return false;
        }
    };

    match store.set(key, &json) {
        Ok(()) => {
            tracing::debug!("Persisted {} record ({} bytes)", key, json.len());
            true
        }
        Err(e) => {
            tracing::warn!("Failed to persist {} record, persistence skipped: {}", key, e);
            false
        }
    }
}

//! Key-value persistence layer.
//!
//! Every store in the application persists through a [`KeyValueStore`]: a
//! string-keyed, string-valued map with synchronous `get`/`set`/`remove`.
//! Each typed store owns one key from [`keys`] and writes its record as a
//! single JSON value, so stores never observe each other's partial writes.
//!
//! # Backends
//!
//! - [`FileStore`]: one `<key>.json` file per key inside a data directory,
//!   replaced atomically on every write
//! - [`MemoryStore`]: process-local map with an optional byte quota, used for
//!   tests and `--ephemeral` runs
//!
//! Reads never fail: a value that cannot be read is reported as absent.
//! Writes can fail (I/O, quota); callers in [`crate::stores`] treat that as a
//! non-fatal "persistence skipped" condition.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::sync::Arc;
use thiserror::Error;

/// Fixed keys of the persisted state layout.
pub mod keys {
    pub const SETTINGS: &str = "settings";
    pub const STATS: &str = "stats";
    pub const HISTORY: &str = "history";
    pub const THEME: &str = "theme";
    pub const LANGUAGE: &str = "language";
}

/// Errors raised by store writes
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage quota exceeded: {needed} bytes needed, {available} available")]
    QuotaExceeded { needed: usize, available: usize },

    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// String-keyed, string-valued persistent store.
pub trait KeyValueStore: Send + Sync {
    /// Read the value under `key`, `None` when absent or unreadable.
    fn get(&self, key: &str) -> Option<String>;

    /// Replace the value under `key` as a whole.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete the value under `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Shared handle every typed store is constructed with.
pub type StoreHandle = Arc<dyn KeyValueStore>;

/// Keys map to file names, so only a conservative character set is allowed.
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
        && !key.starts_with('.');

    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

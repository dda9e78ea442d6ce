use super::{load_json, persist_json};
use crate::models::Settings;
use crate::storage::{StoreHandle, keys};

/// Typed view over the persisted [`Settings`] record.
#[derive(Clone)]
pub struct SettingsStore {
    store: StoreHandle,
}

impl SettingsStore {
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }

    /// Load settings, merging the stored record over the defaults.
    ///
    /// Never fails: a missing or unreadable record yields [`Settings::default`].
    pub fn load(&self) -> Settings {
        load_json(self.store.as_ref(), keys::SETTINGS).unwrap_or_default()
    }

    /// Persist `settings` as a whole.
    ///
    /// # Returns
    /// `false` if the write failed and persistence was skipped
    pub fn save(&self, settings: &Settings) -> bool {
        persist_json(self.store.as_ref(), keys::SETTINGS, settings)
    }

    /// Load, mutate and save in one step.
    pub fn update<F>(&self, f: F) -> Settings
    where
        F: FnOnce(&mut Settings),
    {
        let mut settings = self.load();
        f(&mut settings);
        self.save(&settings);
        settings
    }

    /// Restore defaults and persist them.
    pub fn reset(&self) -> Settings {
        let settings = Settings::default();
        self.save(&settings);
        tracing::info!("Settings reset to defaults");
        settings
    }
}

use super::{load_json, persist_json};
use crate::models::{Language, Theme};
use crate::storage::{StoreHandle, keys};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

/// A single persisted enum preference.
///
/// Absent or unreadable values fall back to `T::default()`.
pub struct PreferenceStore<T> {
    store: StoreHandle,
    key: &'static str,
    _marker: PhantomData<T>,
}

pub type ThemeStore = PreferenceStore<Theme>;
pub type LanguageStore = PreferenceStore<Language>;

impl<T> PreferenceStore<T>
where
    T: Serialize + DeserializeOwned + Default + Copy + std::fmt::Debug,
{
    pub fn new(store: StoreHandle, key: &'static str) -> Self {
        Self {
            store,
            key,
            _marker: PhantomData,
        }
    }

    pub fn current(&self) -> T {
        load_json(self.store.as_ref(), self.key).unwrap_or_default()
    }

    /// Persist `value` as the active preference and return it.
    pub fn apply(&self, value: T) -> T {
        persist_json(self.store.as_ref(), self.key, &value);
        tracing::debug!("Applied {} = {:?}", self.key, value);
        value
    }
}

impl PreferenceStore<Theme> {
    pub fn theme(store: StoreHandle) -> Self {
        Self::new(store, keys::THEME)
    }

    /// Switch between light and dark.
    pub fn toggle(&self) -> Theme {
        self.apply(self.current().toggled())
    }
}

impl PreferenceStore<Language> {
    pub fn language(store: StoreHandle) -> Self {
        Self::new(store, keys::LANGUAGE)
    }
}

impl<T> Clone for PreferenceStore<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            key: self.key,
            _marker: PhantomData,
        }
    }
}

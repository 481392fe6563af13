//! Persisted crop and export settings.
//!
//! Settings live in a flat string key-value store (browser `localStorage` in
//! the plugin, [`MemoryStore`] elsewhere). Every field sits under its own
//! prefixed key as a JSON value, so one damaged entry never takes the others
//! down with it.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::params::{validate, CropParameters, RawParameters, RawValue, Validated};

/// Prefix for every key this crate writes.
pub const STORAGE_PREFIX: &str = "framestack:";

const KEY_CROP_TOP: &str = "cropTopPercent";
const KEY_CROP_BOTTOM: &str = "cropBottomPercent";
const KEY_EXPORT_FORMAT: &str = "exportFormat";
const KEY_EXPORT_QUALITY: &str = "exportQuality";
const KEY_LAST_SAVED: &str = "lastSaved";

const ALL_KEYS: [&str; 5] = [
    KEY_CROP_TOP,
    KEY_CROP_BOTTOM,
    KEY_EXPORT_FORMAT,
    KEY_EXPORT_QUALITY,
    KEY_LAST_SAVED,
];

/// Errors from the backing store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The store cannot be reached at all (disabled, private mode, ...).
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// A single write was refused, e.g. quota exceeded.
    #[error("Failed to write '{key}': {message}")]
    Write { key: String, message: String },

    #[error("Failed to serialize setting: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A flat string key-value store.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// In-memory [`KeyValueStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Loads and saves [`CropParameters`] through a [`KeyValueStore`].
#[derive(Debug)]
pub struct ParameterStore<S> {
    store: S,
    last_saved: Option<CropParameters>,
}

impl<S: KeyValueStore> ParameterStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            last_saved: None,
        }
    }

    /// Read the persisted settings.
    ///
    /// Never fails. Missing keys fall back to defaults, keys holding
    /// unreadable JSON are deleted, and the result is run through
    /// [`validate`] so values written by an older build are brought back
    /// into range.
    pub fn load(&mut self) -> Validated {
        let raw = RawParameters {
            crop_top_percent: self.read::<RawValue>(KEY_CROP_TOP),
            crop_bottom_percent: self.read::<RawValue>(KEY_CROP_BOTTOM),
            export_format: self.read::<String>(KEY_EXPORT_FORMAT),
            export_quality: self.read::<RawValue>(KEY_EXPORT_QUALITY),
        };
        let complete = raw.crop_top_percent.is_some()
            && raw.crop_bottom_percent.is_some()
            && raw.export_format.is_some()
            && raw.export_quality.is_some();

        let validated = validate(&raw, None);
        // What is on disk already matches; the first save can be skipped
        if complete && validated.is_unchanged() {
            self.last_saved = Some(validated.params);
        }

        log::debug!("loaded parameters: {:?}", validated.params);
        validated
    }

    /// Persist `params`, stamping the save time.
    ///
    /// Returns `Ok(false)` without touching the store when `params` equals
    /// the last set saved or loaded.
    ///
    /// Keys are written one at a time with `lastSaved` last. If a write
    /// fails, keys written before it keep their new values; the stamp is
    /// removed and the next call writes every key again.
    pub fn save(
        &mut self,
        params: &CropParameters,
        now: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        if self.last_saved.as_ref() == Some(params) {
            return Ok(false);
        }

        if let Err(e) = self.write_all(params, now) {
            self.last_saved = None;
            if let Err(remove_err) = self.store.remove(&prefixed(KEY_LAST_SAVED)) {
                log::warn!("Failed to clear {}: {}", KEY_LAST_SAVED, remove_err);
            }
            log::warn!("Settings only partly saved: {}", e);
            return Err(e);
        }

        self.last_saved = Some(*params);
        log::debug!("saved parameters at {}", now);
        Ok(true)
    }

    /// When the settings were last written, if ever.
    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        let stamp: String = self.read_quiet(KEY_LAST_SAVED)?;
        DateTime::parse_from_rfc3339(&stamp)
            .ok()
            .map(|time| time.with_timezone(&Utc))
    }

    /// Delete every stored setting.
    pub fn clear(&mut self) -> Result<(), StorageError> {
        for key in ALL_KEYS {
            self.store.remove(&prefixed(key))?;
        }
        self.last_saved = None;
        Ok(())
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    fn write_all(
        &mut self,
        params: &CropParameters,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        self.write(KEY_CROP_TOP, &params.crop_top_percent)?;
        self.write(KEY_CROP_BOTTOM, &params.crop_bottom_percent)?;
        self.write(KEY_EXPORT_FORMAT, &params.export_format)?;
        self.write(KEY_EXPORT_QUALITY, &params.export_quality)?;
        self.write(
            KEY_LAST_SAVED,
            &now.to_rfc3339_opts(SecondsFormat::Millis, true),
        )
    }

    fn write<T: serde::Serialize + ?Sized>(
        &mut self,
        key: &str,
        value: &T,
    ) -> Result<(), StorageError> {
        let json = serde_json::to_string(value)?;
        self.store.set(&prefixed(key), &json)
    }

    fn read_quiet<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let text = self.store.get(&prefixed(key)).ok().flatten()?;
        serde_json::from_str(&text).ok()
    }

    fn read<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        let full_key = prefixed(key);
        let text = match self.store.get(&full_key) {
            Ok(Some(text)) => text,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("Failed to read setting {}: {}", key, e);
                return None;
            }
        };

        match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Removing corrupted setting {}: {}", key, e);
                if let Err(e) = self.store.remove(&full_key) {
                    log::warn!("Failed to remove setting {}: {}", key, e);
                }
                None
            }
        }
    }
}

fn prefixed(key: &str) -> String {
    format!("{STORAGE_PREFIX}{key}")
}

//! Parameter persistence over `window.localStorage`.

use framestack_core::storage::{KeyValueStore, ParameterStore, StorageError};
use wasm_bindgen::prelude::*;
use web_sys::Storage;

use crate::error::{js_message, to_js_error};
use crate::params::{params_from_js, to_js, JsValidated};

/// [`KeyValueStore`] backed by the browser's local storage.
pub struct LocalStorage {
    storage: Storage,
}

impl LocalStorage {
    /// The window's local storage, if the page may use it.
    pub fn open() -> Result<Self, StorageError> {
        let window = web_sys::window()
            .ok_or_else(|| StorageError::Unavailable("no window".to_string()))?;
        let storage = window
            .local_storage()
            .map_err(|e| StorageError::Unavailable(js_message(&e)))?
            .ok_or_else(|| StorageError::Unavailable("localStorage is disabled".to_string()))?;
        Ok(Self { storage })
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage
            .get_item(key)
            .map_err(|e| StorageError::Unavailable(js_message(&e)))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage
            .set_item(key, value)
            .map_err(|e| StorageError::Write {
                key: key.to_string(),
                message: js_message(&e),
            })
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.storage
            .remove_item(key)
            .map_err(|e| StorageError::Unavailable(js_message(&e)))
    }
}

/// Saved crop and export settings.
///
/// ```typescript
/// const store = new JsParameterStore();
/// const { params, notices } = store.load();
/// // later, after validation
/// store.save(params);
/// ```
#[wasm_bindgen]
pub struct JsParameterStore {
    inner: ParameterStore<LocalStorage>,
}

#[wasm_bindgen]
impl JsParameterStore {
    /// Open the store. Throws `kind: "storage"` when local storage is off.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<JsParameterStore, JsValue> {
        let storage = LocalStorage::open().map_err(to_js_error)?;
        Ok(Self {
            inner: ParameterStore::new(storage),
        })
    }

    /// Load the saved settings, falling back to defaults.
    ///
    /// Returns the same shape as `validate_parameters`.
    pub fn load(&mut self) -> Result<JsValue, JsValue> {
        to_js(&JsValidated::from(self.inner.load()))
    }

    /// Save `params` (validated first). Returns `false` if nothing changed.
    pub fn save(&mut self, params: JsValue) -> Result<bool, JsValue> {
        let params = params_from_js(params)?;
        self.inner
            .save(&params, chrono::Utc::now())
            .map_err(to_js_error)
    }

    /// RFC 3339 time of the last save, if any.
    pub fn last_saved(&self) -> Option<String> {
        self.inner.last_saved_at().map(|time| time.to_rfc3339())
    }

    /// Remove all saved settings.
    pub fn clear(&mut self) -> Result<(), JsValue> {
        self.inner.clear().map_err(to_js_error)
    }
}

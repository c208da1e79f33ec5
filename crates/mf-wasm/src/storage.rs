//! The browser's `localStorage` as a [`Storage`].

use mf_core::{Storage, StorageError};
use wasm_bindgen::{JsCast, JsValue};

pub struct LocalStorage {
    inner: Option<web_sys::Storage>,
}

impl LocalStorage {
    /// Open `window.localStorage`. When it is unavailable (private mode,
    /// sandboxed frame) every operation fails with `Unavailable`.
    pub fn open() -> Self {
        let inner = web_sys::window().and_then(|w| w.local_storage().ok().flatten());
        if inner.is_none() {
            log::warn!("localStorage is unavailable; saving is disabled");
        }
        Self { inner }
    }

    fn storage(&self) -> Result<&web_sys::Storage, StorageError> {
        self.inner
            .as_ref()
            .ok_or_else(|| StorageError::Unavailable("localStorage".to_string()))
    }
}

impl Storage for LocalStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage()?.get_item(key).map_err(storage_error)
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage()?.set_item(key, value).map_err(storage_error)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.storage()?.remove_item(key).map_err(storage_error)
    }
}

fn storage_error(err: JsValue) -> StorageError {
    let name = err.dyn_ref::<js_sys::Error>().map(|e| String::from(e.name()));
    match name.as_deref() {
        Some("QuotaExceededError") => StorageError::QuotaExceeded,
        _ => StorageError::Unavailable(
            err.as_string()
                .or(name)
                .unwrap_or_else(|| "localStorage error".to_string()),
        ),
    }
}

use std::cell::RefCell;
use std::collections::HashMap;
use std::convert::Infallible;
use std::rc::Rc;
use wasm_bindgen::JsValue;

/// Synchronous string key-value store backing the save slot.
pub trait KeyValueStore {
    type Error: std::error::Error + 'static;

    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store rejects the write.
    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("localStorage unavailable")]
    Unavailable,
    #[error("storage error: {0}")]
    Js(String),
}

fn js_message(value: &JsValue) -> String {
    value
        .as_string()
        .unwrap_or_else(|| format!("{:?}", value))
}

/// Browser `localStorage`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalStore;

impl LocalStore {
    fn storage(&self) -> Result<web_sys::Storage, StorageError> {
        web_sys::window()
            .ok_or(StorageError::Unavailable)?
            .local_storage()
            .map_err(|e| StorageError::Js(js_message(&e)))?
            .ok_or(StorageError::Unavailable)
    }
}

impl KeyValueStore for LocalStore {
    type Error = StorageError;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        self.storage()?
            .get_item(key)
            .map_err(|e| StorageError::Js(js_message(&e)))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        self.storage()?
            .set_item(key, value)
            .map_err(|e| StorageError::Js(js_message(&e)))
    }
}

/// In-process store; clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl KeyValueStore for MemoryStore {
    type Error = Infallible;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

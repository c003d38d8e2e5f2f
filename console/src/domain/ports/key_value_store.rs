//! Driven port for the persisted key-value slots that hold the credential.
//!
//! The capability set mirrors browser local storage: named string slots that
//! can be read, overwritten and removed.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use super::define_port_error;

define_port_error! {
    /// Errors surfaced by key-value storage adapters.
    pub enum KeyValueStoreError {
        /// The backing medium could not be read or decoded.
        Read { message: String } =>
            "key-value store read failed: {message}",
        /// The backing medium could not be written.
        Write { message: String } =>
            "key-value store write failed: {message}",
    }
}

/// Port for named string slots.
#[cfg_attr(test, mockall::automock)]
pub trait KeyValueStore: Send + Sync {
    /// Read a slot, returning `None` when it has never been written.
    fn get(&self, key: &str) -> Result<Option<String>, KeyValueStoreError>;

    /// Overwrite a slot.
    fn set(&self, key: &str, value: &str) -> Result<(), KeyValueStoreError>;

    /// Remove a slot. Removing a missing slot succeeds.
    fn remove(&self, key: &str) -> Result<(), KeyValueStoreError>;
}

/// Process-local storage used by tests and embedders without a disk.
///
/// # Examples
/// ```
/// use chatbot_console::domain::ports::{InMemoryKeyValueStore, KeyValueStore};
///
/// let store = InMemoryKeyValueStore::default();
/// store.set("authToken", "abc").unwrap();
/// assert_eq!(store.get("authToken").unwrap().as_deref(), Some("abc"));
/// store.remove("authToken").unwrap();
/// assert_eq!(store.get("authToken").unwrap(), None);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    slots: Mutex<HashMap<String, String>>,
}

impl InMemoryKeyValueStore {
    /// Store pre-populated with one slot.
    pub fn with_slot(key: impl Into<String>, value: impl Into<String>) -> Self {
        let store = Self::default();
        store
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into());
        store
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, KeyValueStoreError> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(slots.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KeyValueStoreError> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), KeyValueStoreError> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.remove(key);
        Ok(())
    }
}

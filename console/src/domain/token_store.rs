//! Persistence of the bearer credential.
//!
//! The credential lives in a single storage slot. Values that fail structural
//! validation, or that cannot be read, are indistinguishable from absence.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::domain::credential::Credential;
use crate::domain::error::ApiError;
use crate::domain::ports::{KeyValueStore, KeyValueStoreError};

/// Storage slot holding the bearer credential.
pub const TOKEN_KEY: &str = "authToken";

/// Failures raised by [`TokenStore`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenStoreError {
    /// A credential was required but none valid is stored.
    #[error("Unauthorized! Please login.")]
    Missing,
    /// The storage adapter rejected a write or removal.
    #[error(transparent)]
    Storage(#[from] KeyValueStoreError),
}

impl From<TokenStoreError> for ApiError {
    fn from(error: TokenStoreError) -> Self {
        match error {
            TokenStoreError::Missing => Self::Unauthorized,
            TokenStoreError::Storage(inner) => Self::ApplicationError {
                message: inner.to_string(),
            },
        }
    }
}

/// Reads and writes the credential slot.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn KeyValueStore>,
}

impl TokenStore {
    /// Wrap a storage adapter.
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    /// Stored credential, or `""` when none is usable.
    ///
    /// # Errors
    ///
    /// Returns [`TokenStoreError::Missing`] when `required` is set and no
    /// structurally valid credential is stored.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use chatbot_console::domain::TokenStore;
    /// use chatbot_console::domain::ports::InMemoryKeyValueStore;
    ///
    /// let tokens = TokenStore::new(Arc::new(InMemoryKeyValueStore::default()));
    /// assert_eq!(tokens.get(false).unwrap(), "");
    /// assert!(tokens.get(true).is_err());
    /// ```
    pub fn get(&self, required: bool) -> Result<String, TokenStoreError> {
        match self.credential() {
            Some(credential) => Ok(credential.as_str().to_owned()),
            None if required => Err(TokenStoreError::Missing),
            None => Ok(String::new()),
        }
    }

    /// Decoded credential, when a valid one is stored.
    pub fn credential(&self) -> Option<Credential> {
        let raw = match self.storage.get(TOKEN_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(error) => {
                debug!(error = %error, "credential slot unreadable; treating as absent");
                return None;
            }
        };
        match Credential::parse(&raw) {
            Ok(credential) => Some(credential),
            Err(error) => {
                debug!(error = %error, "stored credential is malformed; treating as absent");
                None
            }
        }
    }

    /// Persist a credential, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`TokenStoreError::Storage`] when the adapter cannot write.
    pub fn set(&self, token: &str) -> Result<(), TokenStoreError> {
        self.storage.set(TOKEN_KEY, token)?;
        Ok(())
    }

    /// Remove the credential. Clearing an empty slot succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`TokenStoreError::Storage`] when the adapter cannot remove.
    pub fn clear(&self) -> Result<(), TokenStoreError> {
        self.storage.remove(TOKEN_KEY)?;
        Ok(())
    }
}

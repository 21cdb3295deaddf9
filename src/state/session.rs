// Session bearer credential: in-memory value backed by persistent storage

use crate::core::constants::storage::SESSION_TOKEN_KEY;
use crate::core::errors::EnvelopeError;
use crate::state::kv::KeyValueStore;
use std::sync::{Arc, RwLock};
use tracing::warn;

/// Holds the current session bearer credential.
///
/// The in-memory value is authoritative and updated synchronously;
/// persistence is best-effort relative to it. At most one token is live at
/// a time - `set` overwrites, never merges.
pub struct SessionTokenStore {
    token: RwLock<Option<String>>,
    storage: Arc<dyn KeyValueStore>,
}

impl SessionTokenStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { token: RwLock::new(None), storage }
    }

    /// Load the persisted credential into memory at process start.
    /// Best-effort: a storage failure is logged and treated as "no token".
    pub async fn load(&self) -> Option<String> {
        match self.storage.read(SESSION_TOKEN_KEY).await {
            Ok(Some(token)) => {
                *self.write_guard() = Some(token.clone());
                Some(token)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Failed to load stored session token");
                None
            }
        }
    }

    /// Current in-memory token, if any.
    pub fn get(&self) -> Option<String> {
        self.token.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Replace the credential: memory first, then persist.
    pub async fn set(&self, token: &str) -> Result<(), EnvelopeError> {
        *self.write_guard() = Some(token.to_string());
        self.storage.write(SESSION_TOKEN_KEY, token).await
    }

    /// Remove the credential: memory first, then erase the persisted value.
    /// Invoked by the engine whenever the server signals an expired session.
    pub async fn clear(&self) -> Result<(), EnvelopeError> {
        *self.write_guard() = None;
        self.storage.delete(SESSION_TOKEN_KEY).await
    }

    fn write_guard(&self) -> std::sync::RwLockWriteGuard<'_, Option<String>> {
        self.token.write().unwrap_or_else(|e| e.into_inner())
    }
}

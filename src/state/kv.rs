// Persistent key-value store abstraction

use crate::core::errors::EnvelopeError;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

/// Narrow persistence interface consumed by the session token store.
///
/// Only the session credential goes through this; everything else the
/// envelope layer holds is memory-only by design.
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn read(&self, key: &str) -> Result<Option<String>, EnvelopeError>;
    async fn write(&self, key: &str, value: &str) -> Result<(), EnvelopeError>;
    async fn delete(&self, key: &str) -> Result<(), EnvelopeError>;
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn read(&self, key: &str) -> Result<Option<String>, EnvelopeError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| EnvelopeError::Storage(format!("store lock poisoned: {}", e)))?;
        Ok(entries.get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), EnvelopeError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| EnvelopeError::Storage(format!("store lock poisoned: {}", e)))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), EnvelopeError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| EnvelopeError::Storage(format!("store lock poisoned: {}", e)))?;
        entries.remove(key);
        Ok(())
    }
}

/// File-backed store: one file per key under a directory. Survives process
/// restarts, which is what the session credential needs.
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    /// Create a store rooted at `dir`, creating the directory if missing.
    pub async fn new(dir: PathBuf) -> Result<Self, EnvelopeError> {
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| EnvelopeError::Storage(format!("failed to create storage dir: {}", e)))?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, EnvelopeError> {
        // Keys are internal constants, but refuse anything that could
        // escape the storage directory.
        if key.is_empty() || key.contains(['/', '\\', '.']) {
            return Err(EnvelopeError::Storage(format!("invalid storage key: {:?}", key)));
        }
        Ok(self.dir.join(key))
    }
}

#[async_trait::async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn read(&self, key: &str) -> Result<Option<String>, EnvelopeError> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(EnvelopeError::Storage(format!("read failed: {}", e))),
        }
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), EnvelopeError> {
        let path = self.path_for(key)?;
        tokio::fs::write(&path, value)
            .await
            .map_err(|e| EnvelopeError::Storage(format!("write failed: {}", e)))
    }

    async fn delete(&self, key: &str) -> Result<(), EnvelopeError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(EnvelopeError::Storage(format!("delete failed: {}", e))),
        }
    }
}

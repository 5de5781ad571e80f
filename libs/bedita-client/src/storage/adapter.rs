use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// Storage backend error types.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StorageError {
    /// Filesystem failure
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Store content could not be encoded or decoded
    #[error("Storage encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Raw asynchronous key/value storage.
///
/// All methods operate on pre-namespaced keys; namespacing is the
/// [`StorageService`](crate::storage::StorageService)'s job.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Get the stored value for `key`, or `None` when absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Set a value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a key. Removing an absent key is a no-op.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Clear the whole store.
    async fn empty(&self) -> Result<(), StorageError>;
}

/// In-memory storage adapter. The default backend.
#[derive(Default)]
pub struct MemoryStorageAdapter {
    store: Mutex<HashMap<String, String>>,
}

impl MemoryStorageAdapter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageAdapter for MemoryStorageAdapter {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.store.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.store.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.store.lock().remove(key);
        Ok(())
    }

    async fn empty(&self) -> Result<(), StorageError> {
        self.store.lock().clear();
        Ok(())
    }
}

/// File-backed storage adapter: one JSON object per store.
///
/// Every operation is a read-modify-write of the whole file, serialized
/// through an async mutex, so concurrent calls on the same adapter never
/// interleave partial writes. The file is created on first `set`.
pub struct FileStorageAdapter {
    path: PathBuf,
    guard: tokio::sync::Mutex<()>,
}

impl FileStorageAdapter {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: tokio::sync::Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<Map<String, Value>, StorageError> {
        match tokio::fs::read(&self.path).await {
            Ok(raw) => {
                let value: Value = serde_json::from_slice(&raw)?;
                Ok(value.as_object().cloned().unwrap_or_default())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn persist(&self, store: &Map<String, Value>) -> Result<(), StorageError> {
        let raw = serde_json::to_vec(store)?;
        tokio::fs::write(&self.path, raw).await?;
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for FileStorageAdapter {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.guard.lock().await;
        let store = self.load().await?;
        Ok(store.get(key).and_then(Value::as_str).map(str::to_owned))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.guard.lock().await;
        let mut store = self.load().await?;
        store.insert(key.to_owned(), Value::String(value.to_owned()));
        self.persist(&store).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.guard.lock().await;
        let mut store = self.load().await?;
        if store.remove(key).is_some() {
            self.persist(&store).await?;
        }
        Ok(())
    }

    async fn empty(&self) -> Result<(), StorageError> {
        let _guard = self.guard.lock().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

use async_trait::async_trait;
use quiz_core::model::UserProgress;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::progress_store::ProgressStore;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Opaque string-keyed blob store.
///
/// Adapters know nothing about what the values mean; typed access goes
/// through wrappers such as [`ProgressStore`].
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read. A missing key is
    /// `Ok(None)`, not an error.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be written.
    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Repository contract for the learner's progress snapshot.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Load the last saved snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if a snapshot exists but cannot
    /// be decoded, or other storage errors. Nothing saved yet is `Ok(None)`.
    async fn load_progress(&self) -> Result<Option<UserProgress>, StorageError>;

    /// Replace the stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be encoded or stored.
    async fn save_progress(&self, progress: &UserProgress) -> Result<(), StorageError>;
}

/// Simple in-memory store for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(key);
        Ok(())
    }
}

/// Aggregates the raw store and the typed progress repository behind trait
/// objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub kv: Arc<dyn KeyValueStore>,
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    /// Wire a `Storage` around any key-value backend.
    #[must_use]
    pub fn from_store(kv: Arc<dyn KeyValueStore>) -> Self {
        let progress: Arc<dyn ProgressRepository> = Arc::new(ProgressStore::new(Arc::clone(&kv)));
        Self { kv, progress }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_store(Arc::new(InMemoryStore::new()))
    }
}

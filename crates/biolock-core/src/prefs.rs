use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use thiserror::Error;

/// Errors produced by preference store implementations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PrefStoreError {
    /// Underlying backend failure.
    #[error("preference backend failure: {reason}")]
    Backend { reason: String },
}

/// Narrow contract over the platform's persisted key-value facility.
///
/// Values are opaque strings; callers own their wire format. An absent key
/// reads back as `None` rather than an error.
#[async_trait]
pub trait PrefStore: Send + Sync {
    /// Read the value for a key, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, PrefStoreError>;

    /// Persist a value under a key, atomically replacing any existing entry.
    async fn put(&self, key: &str, value: &str) -> Result<(), PrefStoreError>;
}

/// In-memory preference store for tests and smoke runs.
#[derive(Debug, Default, Clone)]
pub struct InMemoryPrefStore {
    inner: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryPrefStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PrefStore for InMemoryPrefStore {
    async fn get(&self, key: &str) -> Result<Option<String>, PrefStoreError> {
        let map = self.inner.lock().map_err(|err| PrefStoreError::Backend {
            reason: format!("lock poisoned: {err}"),
        })?;
        Ok(map.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), PrefStoreError> {
        let mut map = self.inner.lock().map_err(|err| PrefStoreError::Backend {
            reason: format!("lock poisoned: {err}"),
        })?;
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

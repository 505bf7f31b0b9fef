//! In-memory credential store.
//!
//! Thread-safe, process-local storage for the access token and profile.
//! Nothing survives a restart; the file-backed store in the
//! infrastructure crate is the durable counterpart.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::ports::{CredentialKey, CredentialStore, CredentialStoreError};

/// Thread-safe in-memory credential store.
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    values: Arc<RwLock<HashMap<CredentialKey, String>>>,
}

impl MemoryCredentialStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get count of stored values.
    pub async fn count(&self) -> usize {
        self.values.read().await.len()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self, key: CredentialKey) -> Result<Option<String>, CredentialStoreError> {
        let values = self.values.read().await;
        Ok(values.get(&key).cloned())
    }

    async fn set(&self, key: CredentialKey, value: String) -> Result<(), CredentialStoreError> {
        let mut values = self.values.write().await;
        values.insert(key, value);
        Ok(())
    }

    async fn remove(&self, key: CredentialKey) -> Result<(), CredentialStoreError> {
        let mut values = self.values.write().await;
        values.remove(&key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), CredentialStoreError> {
        let mut values = self.values.write().await;
        values.clear();
        Ok(())
    }
}

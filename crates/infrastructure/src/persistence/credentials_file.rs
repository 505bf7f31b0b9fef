//! File-backed credential store.
//!
//! Credentials live in the platform config directory:
//! - Linux: ~/.config/taskdeck/credentials.json
//! - macOS: ~/Library/Application Support/taskdeck/credentials.json
//! - Windows: %APPDATA%/taskdeck/credentials.json

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use taskdeck_application::{CredentialKey, CredentialStore, CredentialStoreError};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use crate::serialization::{from_json_bytes, to_json_stable_bytes};

/// File name of the credentials file.
pub const CREDENTIALS_FILE: &str = "credentials.json";

type Entries = BTreeMap<String, String>;

/// Credential store persisted as one JSON object:
///
/// ```json
/// {
///   "accessToken": "eyJhbGciOi...",
///   "user": "{\"id\":\"u1\",\"email\":\"ada@example.com\",\"name\":\"Ada\"}"
/// }
/// ```
///
/// Writes within one process are serialized; across processes the last
/// writer wins.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileCredentialStore {
    /// Creates a store backed by the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Creates a store in the platform config directory.
    ///
    /// # Errors
    ///
    /// Returns `CredentialStoreError::NoConfigDir` if the platform has none.
    pub fn default_location() -> Result<Self, CredentialStoreError> {
        dirs::config_dir()
            .map(|dir| Self::new(dir.join("taskdeck").join(CREDENTIALS_FILE)))
            .ok_or(CredentialStoreError::NoConfigDir)
    }

    /// The file this store reads and writes.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Entries, CredentialStoreError> {
        match fs::read(&self.path).await {
            Ok(content) => from_json_bytes(&content)
                .map_err(|e| CredentialStoreError::Serialization(e.to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Entries::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, entries: &Entries) -> Result<(), CredentialStoreError> {
        if entries.is_empty() {
            return self.delete_file().await;
        }
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).await?;
        }
        let content = to_json_stable_bytes(entries)
            .map_err(|e| CredentialStoreError::Serialization(e.to_string()))?;
        fs::write(&self.path, content).await?;
        debug!(path = %self.path.display(), keys = entries.len(), "credentials saved");
        Ok(())
    }

    async fn delete_file(&self) -> Result<(), CredentialStoreError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "credentials file removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn get(&self, key: CredentialKey) -> Result<Option<String>, CredentialStoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(key.as_str()))
    }

    async fn set(&self, key: CredentialKey, value: String) -> Result<(), CredentialStoreError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        entries.insert(key.as_str().to_string(), value);
        self.save(&entries).await
    }

    async fn remove(&self, key: CredentialKey) -> Result<(), CredentialStoreError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        if entries.remove(key.as_str()).is_some() {
            self.save(&entries).await?;
        }
        Ok(())
    }

    // A corrupt file must still be removable, so this does not read it first.
    async fn clear(&self) -> Result<(), CredentialStoreError> {
        let _guard = self.lock.lock().await;
        self.delete_file().await
    }

    async fn entries(&self) -> Result<Vec<(CredentialKey, String)>, CredentialStoreError> {
        let _guard = self.lock.lock().await;
        Ok(self
            .load()
            .await?
            .into_iter()
            .filter_map(|(name, value)| CredentialKey::from_name(&name).map(|key| (key, value)))
            .collect())
    }
}

//! Credential store port
//!
//! Defines the interface for the durable key/value storage that holds the
//! access token and the cached user profile.

use std::fmt;

use async_trait::async_trait;

/// Errors that can occur during credential storage operations.
#[derive(Debug, thiserror::Error)]
pub enum CredentialStoreError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Could not determine where to keep credentials.
    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// The keys the client persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CredentialKey {
    /// The opaque access token.
    AccessToken,
    /// The user profile, serialized as JSON.
    User,
}

impl CredentialKey {
    /// Returns every key.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::AccessToken, Self::User]
    }

    /// Storage name of the key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AccessToken => "accessToken",
            Self::User => "user",
        }
    }

    /// Looks a key up by its storage name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.as_str() == name)
    }
}

impl fmt::Display for CredentialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Repository trait for credential persistence.
///
/// There are no transactional guarantees: the last writer wins.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Reads a value.
    async fn get(&self, key: CredentialKey) -> Result<Option<String>, CredentialStoreError>;

    /// Writes a value, replacing any previous one.
    async fn set(&self, key: CredentialKey, value: String) -> Result<(), CredentialStoreError>;

    /// Deletes a value. Deleting a missing key is not an error.
    async fn remove(&self, key: CredentialKey) -> Result<(), CredentialStoreError>;

    /// Deletes every value.
    async fn clear(&self) -> Result<(), CredentialStoreError> {
        for key in CredentialKey::all() {
            self.remove(*key).await?;
        }
        Ok(())
    }

    /// Lists the stored entries.
    async fn entries(&self) -> Result<Vec<(CredentialKey, String)>, CredentialStoreError> {
        let mut entries = Vec::new();
        for key in CredentialKey::all() {
            if let Some(value) = self.get(*key).await? {
                entries.push((*key, value));
            }
        }
        Ok(entries)
    }
}

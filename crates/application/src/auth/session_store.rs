//! Typed session view over a credential store.

use std::fmt;
use std::sync::Arc;

use taskdeck_domain::{Session, UserProfile, token_preview};

use crate::ports::{CredentialKey, CredentialStore, CredentialStoreError};

/// The session state of one client instance.
///
/// Wraps a [`CredentialStore`] with typed access to the access token and
/// the cached profile. Cheap to clone; clones share the same store.
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn CredentialStore>,
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Creates a session view over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Returns the current access token.
    pub async fn access_token(&self) -> Result<Option<String>, CredentialStoreError> {
        self.store.get(CredentialKey::AccessToken).await
    }

    /// Replaces the access token.
    pub async fn set_access_token(&self, token: &str) -> Result<(), CredentialStoreError> {
        self.store
            .set(CredentialKey::AccessToken, token.to_string())
            .await
    }

    /// Returns the cached profile.
    ///
    /// # Errors
    ///
    /// Returns `CredentialStoreError::Serialization` if the stored profile
    /// is not valid JSON.
    pub async fn user(&self) -> Result<Option<UserProfile>, CredentialStoreError> {
        let Some(raw) = self.store.get(CredentialKey::User).await? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| CredentialStoreError::Serialization(e.to_string()))
    }

    /// Persists a complete session (token and profile).
    pub async fn save(&self, session: &Session) -> Result<(), CredentialStoreError> {
        let user = serde_json::to_string(&session.user)
            .map_err(|e| CredentialStoreError::Serialization(e.to_string()))?;
        self.set_access_token(&session.access_token).await?;
        self.store.set(CredentialKey::User, user).await
    }

    /// Returns the stored session if both the token and the profile exist.
    ///
    /// No server round trip is made; an expired token is only discovered
    /// on the next API call.
    pub async fn restore(&self) -> Result<Option<Session>, CredentialStoreError> {
        let user = self.user().await?;
        let token = self.access_token().await?;
        Ok(match (token, user) {
            (Some(token), Some(user)) => Some(Session::new(token, user)),
            _ => None,
        })
    }

    /// Removes the token and the profile.
    pub async fn clear(&self) -> Result<(), CredentialStoreError> {
        self.store.clear().await
    }

    /// Stored entries for diagnostics, with tokens shortened.
    pub async fn snapshot(&self) -> Result<Vec<(String, String)>, CredentialStoreError> {
        let entries = self.store.entries().await?;
        Ok(entries
            .into_iter()
            .map(|(key, value)| {
                let shown = match key {
                    CredentialKey::AccessToken => token_preview(&value),
                    CredentialKey::User => value,
                };
                (key.to_string(), shown)
            })
            .collect())
    }
}

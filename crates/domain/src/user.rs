//! Users and sessions

use serde::{Deserialize, Serialize};

/// The signed-in user, as returned by the auth endpoints.
///
/// The client treats the profile as opaque and passes it through
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Backend identifier.
    pub id: String,
    /// Login email.
    pub email: String,
    /// Display name.
    pub name: String,
}

/// An authenticated session: the current access token and its user.
///
/// The refresh token never appears here; it lives in an HTTP-only cookie
/// managed by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Short-lived bearer credential.
    pub access_token: String,
    /// Profile cached alongside the token.
    pub user: UserProfile,
}

impl Session {
    /// Creates a new session.
    #[must_use]
    pub fn new(access_token: impl Into<String>, user: UserProfile) -> Self {
        Self {
            access_token: access_token.into(),
            user,
        }
    }
}

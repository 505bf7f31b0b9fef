//! Authentication request and response types

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::user::{Session, UserProfile};

#[allow(clippy::expect_used)]
static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles"));

fn require(field: &'static str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::MissingField { field });
    }
    Ok(())
}

fn validate_email(email: &str) -> DomainResult<()> {
    require("Email", email)?;
    if !EMAIL.is_match(email.trim()) {
        return Err(DomainError::InvalidEmail(email.to_string()));
    }
    Ok(())
}

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Login email
    pub email: String,
    /// Plain-text password, sent over TLS
    pub password: String,
}

impl LoginRequest {
    /// Creates a login request.
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Checks the form before anything is sent.
    ///
    /// # Errors
    ///
    /// Returns the first field that fails validation.
    pub fn validate(&self) -> DomainResult<()> {
        validate_email(&self.email)?;
        require("Password", &self.password)
    }
}

/// Body of `POST /auth/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Login email
    pub email: String,
    /// Plain-text password, sent over TLS
    pub password: String,
    /// Display name
    pub name: String,
}

impl RegisterRequest {
    /// Creates a registration request.
    #[must_use]
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            name: name.into(),
        }
    }

    /// Checks the form before anything is sent.
    ///
    /// # Errors
    ///
    /// Returns the first field that fails validation.
    pub fn validate(&self) -> DomainResult<()> {
        require("Name", &self.name)?;
        validate_email(&self.email)?;
        require("Password", &self.password)
    }
}

/// Response of the login and register endpoints.
///
/// Both fields are optional on the wire so that a missing one can be
/// reported as a malformed response rather than a decode failure.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    /// Fresh access token
    #[serde(default)]
    pub access_token: Option<String>,
    /// The authenticated user
    #[serde(default)]
    pub user: Option<UserProfile>,
}

impl AuthPayload {
    /// Builds a session if both the token and the user are present.
    #[must_use]
    pub fn into_session(self) -> Option<Session> {
        match (self.access_token, self.user) {
            (Some(token), Some(user)) if !token.is_empty() => Some(Session::new(token, user)),
            _ => None,
        }
    }
}

/// Response of `POST /auth/refresh`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshPayload {
    /// Fresh access token
    #[serde(default)]
    pub access_token: Option<String>,
}

impl RefreshPayload {
    /// Returns the token if present and non-empty.
    #[must_use]
    pub fn into_token(self) -> Option<String> {
        self.access_token.filter(|t| !t.is_empty())
    }
}

/// Shortens a token for logs and diagnostics (first 8 chars + "...").
#[must_use]
pub fn token_preview(token: &str) -> String {
    if token.len() > 12 {
        let cut = token
            .char_indices()
            .nth(8)
            .map_or(token.len(), |(idx, _)| idx);
        format!("{}...", &token[..cut])
    } else {
        token.to_string()
    }
}

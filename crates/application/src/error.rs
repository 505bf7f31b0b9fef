//! Application error types

use taskdeck_domain::{ApiResponse, DomainError};
use thiserror::Error;

use crate::ports::{CredentialStoreError, TransportError};

/// Why a token refresh failed.
///
/// Cloneable so that every request waiting on the same refresh observes
/// the same outcome.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RefreshError {
    /// The refresh endpoint answered with a non-2xx status.
    #[error("refresh rejected with status {status}")]
    Rejected {
        /// Status returned by the refresh endpoint.
        status: u16,
    },

    /// The refresh call never got a response.
    #[error("refresh failed: {0}")]
    Transport(#[from] TransportError),

    /// The refresh response did not carry a usable token.
    #[error("malformed refresh response: {0}")]
    MalformedResponse(String),

    /// The new token could not be persisted.
    #[error("could not store refreshed token: {0}")]
    Storage(String),
}

/// Errors surfaced to callers of the client and the use cases.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Input was rejected before any request was sent.
    #[error("{0}")]
    Validation(#[from] DomainError),

    /// No response was received (connection error, timeout).
    #[error("{0}")]
    Transport(#[from] TransportError),

    /// The server still answered 401 and no refresh was possible.
    #[error("not authenticated")]
    Unauthorized(Box<ApiResponse>),

    /// The server answered with a non-2xx status other than 401.
    #[error("request failed with status {}", .0.status)]
    Status(Box<ApiResponse>),

    /// The access token expired and could not be refreshed; the session
    /// has been cleared.
    #[error("session expired: {0}")]
    RefreshFailed(#[from] RefreshError),

    /// A 2xx response was missing required fields.
    #[error("invalid response from server: {0}")]
    MalformedResponse(String),

    /// A 2xx response body could not be decoded.
    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The credential store failed.
    #[error("credential storage failed: {0}")]
    Storage(#[from] CredentialStoreError),
}

impl ApiError {
    /// Returns true for failures that end the session.
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Unauthorized(_) | Self::RefreshFailed(_))
    }

    /// HTTP status of the failing response, if there was one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized(response) | Self::Status(response) => Some(response.status),
            Self::RefreshFailed(RefreshError::Rejected { status }) => Some(*status),
            _ => None,
        }
    }

    /// The server's own explanation, from a `{"message": ...}` body.
    #[must_use]
    pub fn server_message(&self) -> Option<String> {
        match self {
            Self::Unauthorized(response) | Self::Status(response) => response.message(),
            _ => None,
        }
    }

    /// Text suitable for a one-line notice, falling back to `fallback`
    /// when the server did not explain itself.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::RefreshFailed(_) => "Your session has expired. Please log in again.".to_string(),
            _ => self
                .server_message()
                .unwrap_or_else(|| fallback.to_string()),
        }
    }
}

/// Result type alias for client operations.
pub type ApiResult<T> = Result<T, ApiError>;

//! Transport port

use async_trait::async_trait;
use taskdeck_domain::{ApiRequest, ApiResponse};
use thiserror::Error;

/// Errors raised before a response was received.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The request did not complete in time.
    #[error("request timed out after {timeout_ms}ms")]
    Timeout {
        /// The timeout that elapsed.
        timeout_ms: u64,
    },

    /// The connection could not be established or was dropped.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The request URL could not be built.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Any other transport failure.
    #[error("{0}")]
    Other(String),
}

/// Port for sending requests to the backend.
///
/// Implementations resolve `request.path` against the API base URL, send
/// `Content-Type: application/json`, and carry the server's session
/// cookie on every call. Any HTTP status is a successful transport
/// outcome; only failures to get a response are errors.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the request and returns the response.
    ///
    /// # Errors
    ///
    /// Returns an error if no response was received.
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError>;

    /// Forgets session state the transport keeps for the server, such as
    /// the session cookie. Called whenever the local session ends.
    fn clear_session(&self) {}
}

//! Pending API request

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::{Headers, HttpMethod};
use crate::error::{DomainError, DomainResult};

/// Header carrying the bearer credential.
pub const AUTHORIZATION: &str = "Authorization";

const BEARER_PREFIX: &str = "Bearer ";

/// A request on its way to the backend.
///
/// The path is relative to the configured API base URL. A request lives
/// only for the duration of one call through the client; `retried` is set
/// once it has been re-dispatched after a token refresh and is never
/// cleared, which bounds every request to a single retry.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// Correlation id for log lines.
    pub id: Uuid,
    /// HTTP method.
    pub method: HttpMethod,
    /// Path relative to the API base URL, e.g. `/tasks/42`.
    pub path: String,
    /// Query parameters in order.
    pub query: Vec<(String, String)>,
    /// Request headers.
    pub headers: Headers,
    /// JSON body, if any.
    pub body: Option<Value>,
    /// Whether this request has already been retried after a refresh.
    pub retried: bool,
    /// Whether a 401 on this request should trigger a token refresh.
    pub refresh_on_unauthorized: bool,
}

impl ApiRequest {
    /// Creates a request with the given method and path.
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Headers::new(),
            body: None,
            retried: false,
            refresh_on_unauthorized: true,
        }
    }

    /// Creates a GET request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Creates a POST request.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    /// Creates a PATCH request.
    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, path)
    }

    /// Creates a DELETE request.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Appends query parameters.
    #[must_use]
    pub fn with_query<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Serializes `body` as the JSON payload.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidBody` if the value cannot be encoded.
    pub fn with_json<T: Serialize>(mut self, body: &T) -> DomainResult<Self> {
        let value =
            serde_json::to_value(body).map_err(|e| DomainError::InvalidBody(e.to_string()))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Opts this request out of the refresh-on-401 path.
    ///
    /// Used for credential exchanges, where a 401 means the credentials
    /// were wrong rather than that the access token expired.
    #[must_use]
    pub const fn without_refresh(mut self) -> Self {
        self.refresh_on_unauthorized = false;
        self
    }

    /// Attaches `token` as the bearer credential.
    pub fn set_bearer(&mut self, token: &str) {
        self.headers
            .set(AUTHORIZATION, format!("{BEARER_PREFIX}{token}"));
    }

    /// Removes any bearer credential.
    pub fn clear_bearer(&mut self) {
        self.headers.remove(AUTHORIZATION);
    }

    /// Returns the attached bearer token, if any.
    #[must_use]
    pub fn bearer_token(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|v| v.strip_prefix(BEARER_PREFIX))
    }

    /// Returns true if a 401 on this request may still be recovered by a refresh.
    #[must_use]
    pub const fn can_refresh(&self) -> bool {
        self.refresh_on_unauthorized && !self.retried
    }
}

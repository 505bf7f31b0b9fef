//! Taskdeck Application - Ports, the authenticated client and use cases
//!
//! This crate defines the application layer with:
//! - Port traits (transport, credential storage, navigation)
//! - The authenticated API client with single-flight token refresh
//! - Use cases for the session and for tasks
//! - Application-level error handling

pub mod auth;
pub mod client;
pub mod error;
pub mod ports;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod test_support;

pub use auth::{MemoryCredentialStore, RefreshCoordinator, SessionStore};
pub use client::{AuthenticatedClient, RequestPhase};
pub use error::{ApiError, ApiResult, RefreshError};
pub use ports::{
    CredentialKey, CredentialStore, CredentialStoreError, LOGIN_ROUTE, Navigator, Transport,
    TransportError,
};
pub use use_cases::{AuthService, TaskService};

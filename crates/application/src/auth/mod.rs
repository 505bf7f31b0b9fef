//! Session state and token refresh.
//!
//! This module provides:
//! - A typed view of the credential store (`SessionStore`)
//! - An in-memory credential store for tests and embedding
//! - Single-flight coordination of access-token refreshes

mod memory_store;
mod refresh;
mod session_store;

pub use memory_store::MemoryCredentialStore;
pub use refresh::{REFRESH_PATH, RefreshCoordinator};
pub use session_store::SessionStore;

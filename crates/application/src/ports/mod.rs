//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the client core and the outside
//! world. Each port is a trait implemented by adapters in the
//! infrastructure layer or by the front end.

mod credential_store;
mod navigator;
mod transport;

pub use credential_store::{CredentialKey, CredentialStore, CredentialStoreError};
pub use navigator::{LOGIN_ROUTE, Navigator};
pub use transport::{Transport, TransportError};

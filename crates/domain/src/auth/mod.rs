//! Credential exchange types
//!
//! Login and registration forms with their client-side validation, and
//! the payloads the auth endpoints answer with.

mod types;

pub use types::{AuthPayload, LoginRequest, RefreshPayload, RegisterRequest, token_preview};

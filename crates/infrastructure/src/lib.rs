//! Taskdeck Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer, plus configuration loading and
//! tracing setup for binaries.

pub mod adapters;
pub mod config;
pub mod logging;
pub mod persistence;
pub mod serialization;

pub use adapters::ReqwestTransport;
pub use config::{ClientConfig, ConfigError, DEFAULT_TIMEOUT_MS, parse_api_url};
pub use logging::init_tracing;
pub use persistence::{COOKIES_FILE, CREDENTIALS_FILE, FileCredentialStore, CookieJar};
pub use serialization::{SerializationError, from_json_bytes, to_json_stable, to_json_stable_bytes};

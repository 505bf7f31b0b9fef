//! Client configuration.
//!
//! Values come from an optional `taskdeck.toml` in the working directory
//! (or an explicit file), overridden by `TASKDECK_*` environment
//! variables:
//!
//! | Key | Variable | Default |
//! |---|---|---|
//! | `api_url` | `TASKDECK_API_URL` | required |
//! | `request_timeout_ms` | `TASKDECK_REQUEST_TIMEOUT_MS` | `30000` |
//! | `credentials_path` | `TASKDECK_CREDENTIALS_PATH` | platform config dir |
//! | `log_filter` | `TASKDECK_LOG_FILTER` | `info` |

use std::path::{Path, PathBuf};
use std::time::Duration;

use ::config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use taskdeck_application::CredentialStoreError;
use url::Url;

use crate::persistence::FileCredentialStore;

/// Default request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

const ENV_PREFIX: &str = "TASKDECK";
const DEFAULT_FILE: &str = "taskdeck.toml";

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A source could not be read or a value has the wrong type.
    #[error("failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    /// `api_url` is missing.
    #[error("api_url is not set (use TASKDECK_API_URL or taskdeck.toml)")]
    MissingApiUrl,

    /// `api_url` is not an http(s) URL.
    #[error("invalid api_url '{url}': {reason}")]
    InvalidApiUrl {
        /// The configured value.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// `request_timeout_ms` is zero.
    #[error("request_timeout_ms must be greater than zero")]
    InvalidTimeout,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    api_url: Option<String>,
    request_timeout_ms: u64,
    credentials_path: Option<PathBuf>,
    log_filter: Option<String>,
}

/// Validated client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the REST API.
    pub api_url: Url,
    /// Bound on every dispatch, including refresh and retry.
    pub request_timeout_ms: u64,
    /// Where to keep credentials instead of the platform config dir.
    pub credentials_path: Option<PathBuf>,
    /// `tracing` filter directives.
    pub log_filter: Option<String>,
}

impl ClientConfig {
    /// Creates a configuration for `api_url` with defaults for the rest.
    #[must_use]
    pub const fn new(api_url: Url) -> Self {
        Self {
            api_url,
            request_timeout_ms: DEFAULT_TIMEOUT_MS,
            credentials_path: None,
            log_filter: None,
        }
    }

    /// Loads configuration from `file` (or `taskdeck.toml` if present)
    /// and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a source is unreadable or a value is invalid.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_from(file, Environment::with_prefix(ENV_PREFIX))
    }

    fn load_from(file: Option<&Path>, env: Environment) -> Result<Self, ConfigError> {
        let file = match file {
            Some(path) => File::from(path).required(true),
            None => File::new(DEFAULT_FILE, FileFormat::Toml).required(false),
        };
        let raw: RawConfig = Config::builder()
            .set_default("request_timeout_ms", DEFAULT_TIMEOUT_MS)?
            .add_source(file)
            .add_source(env.try_parsing(true))
            .build()?
            .try_deserialize()?;
        raw.validate()
    }

    /// The request timeout as a `Duration`.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Opens the credential store this configuration points at.
    ///
    /// # Errors
    ///
    /// Returns `CredentialStoreError::NoConfigDir` if no path is configured
    /// and the platform has no config directory.
    pub fn credential_store(&self) -> Result<FileCredentialStore, CredentialStoreError> {
        self.credentials_path.as_ref().map_or_else(
            FileCredentialStore::default_location,
            |path| Ok(FileCredentialStore::new(path)),
        )
    }
}

impl RawConfig {
    fn validate(self) -> Result<ClientConfig, ConfigError> {
        let raw_url = self.api_url.ok_or(ConfigError::MissingApiUrl)?;
        let api_url = parse_api_url(&raw_url)?;
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(ClientConfig {
            api_url,
            request_timeout_ms: self.request_timeout_ms,
            credentials_path: self.credentials_path,
            log_filter: self.log_filter.filter(|f| !f.trim().is_empty()),
        })
    }
}

/// Parses and checks an API base URL.
///
/// # Errors
///
/// Returns `ConfigError::InvalidApiUrl` unless the value is an absolute
/// http or https URL.
pub fn parse_api_url(value: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidApiUrl {
        url: value.to_string(),
        reason,
    };
    let url = Url::parse(value.trim()).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme '{other}'"))),
    }
}

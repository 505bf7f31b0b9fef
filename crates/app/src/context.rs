//! Wiring of adapters, client and services.

use std::sync::Arc;

use taskdeck_application::{
    ApiError, AuthService, AuthenticatedClient, CredentialStore, CredentialStoreError, Navigator,
    SessionStore, TaskService, TransportError,
};
use taskdeck_infrastructure::{COOKIES_FILE, ClientConfig, ConfigError, CookieJar, ReqwestTransport};
use thiserror::Error;
use tracing::debug;

/// Errors surfaced by the command-line front end.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The credential store could not be opened.
    #[error("credential store: {0}")]
    Storage(#[from] CredentialStoreError),

    /// The HTTP transport could not be built.
    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    /// An API call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The command needs a session and there is none.
    #[error("not logged in. Run `taskdeck login` first.")]
    NotLoggedIn,

    /// The command line was inconsistent.
    #[error("{0}")]
    Usage(String),
}

impl AppError {
    /// One-line notice for the terminal.
    #[must_use]
    pub fn notice(&self) -> String {
        match self {
            Self::Api(error) => error.user_message("Request failed"),
            other => other.to_string(),
        }
    }
}

/// Everything a command needs: the services and the configuration behind them.
#[derive(Debug, Clone)]
pub struct Taskdeck {
    /// Session use cases
    pub auth: AuthService,
    /// Task use cases
    pub tasks: TaskService,
    client: Arc<AuthenticatedClient>,
    config: ClientConfig,
}

impl Taskdeck {
    /// Builds the service graph from `config`, using the configured file
    /// credential store and a cookie file next to it.
    ///
    /// # Errors
    ///
    /// Returns an error if the store location or the transport cannot be set up.
    pub fn connect(config: ClientConfig, navigator: Arc<dyn Navigator>) -> Result<Self, AppError> {
        let store = config.credential_store()?;
        let cookies = CookieJar::open(store.path().with_file_name(COOKIES_FILE));
        debug!(path = %store.path().display(), "using credential file");
        Self::build(config, Arc::new(store), Arc::new(cookies), navigator)
    }

    fn build(
        config: ClientConfig,
        store: Arc<dyn CredentialStore>,
        cookies: Arc<CookieJar>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, AppError> {
        let timeout = config.request_timeout();
        let transport = ReqwestTransport::with_cookie_jar(config.api_url.clone(), timeout, cookies)?;
        let client = Arc::new(AuthenticatedClient::new(
            Arc::new(transport),
            SessionStore::new(store),
            navigator,
            timeout,
        ));
        Ok(Self {
            auth: AuthService::new(Arc::clone(&client)),
            tasks: TaskService::new(Arc::clone(&client)),
            client,
            config,
        })
    }

    /// The configuration this context was built from.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The credential session shared by every service.
    #[must_use]
    pub fn session(&self) -> &SessionStore {
        self.client.session()
    }

    /// Drops every stored credential and the session cookie.
    ///
    /// # Errors
    ///
    /// Returns an error if the credential store cannot be cleared.
    pub async fn clear_session(&self) -> Result<(), AppError> {
        Ok(self.client.end_session().await?)
    }

    /// Refreshes the access token on demand.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::RefreshFailed` if the server refused; the session
    /// has been cleared.
    pub async fn refresh(&self) -> Result<(), AppError> {
        self.client
            .refresh()
            .await
            .map_err(|e| AppError::Api(e.into()))?;
        Ok(())
    }
}

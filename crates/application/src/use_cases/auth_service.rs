//! Session use cases: bootstrap, login, registration and logout.

use std::sync::Arc;

use taskdeck_domain::{ApiRequest, AuthPayload, LoginRequest, RegisterRequest, UserProfile};
use tracing::{debug, info, warn};

use crate::client::AuthenticatedClient;
use crate::error::{ApiError, ApiResult};
use crate::ports::CredentialStoreError;

/// Path of the login endpoint.
pub const LOGIN_PATH: &str = "/auth/login";
/// Path of the registration endpoint.
pub const REGISTER_PATH: &str = "/auth/register";
/// Path of the logout endpoint.
pub const LOGOUT_PATH: &str = "/auth/logout";

/// Use case for establishing and ending the user's session.
#[derive(Debug, Clone)]
pub struct AuthService {
    client: Arc<AuthenticatedClient>,
}

impl AuthService {
    /// Creates a new `AuthService` over the given client.
    #[must_use]
    pub const fn new(client: Arc<AuthenticatedClient>) -> Self {
        Self { client }
    }

    /// Checks for a locally usable session at startup.
    ///
    /// Returns the cached profile when both a profile and a token are
    /// stored. Nothing is sent to the server. A corrupt cached profile
    /// logs the user out.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Storage` if the credential store cannot be read.
    pub async fn restore(&self) -> ApiResult<Option<UserProfile>> {
        match self.client.session().restore().await {
            Ok(Some(session)) => {
                debug!(email = %session.user.email, "session restored from storage");
                Ok(Some(session.user))
            }
            Ok(None) => {
                debug!("no stored session");
                Ok(None)
            }
            Err(CredentialStoreError::Serialization(error)) => {
                warn!(%error, "stored profile is unreadable, logging out");
                self.logout().await?;
                Ok(None)
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Logs in and stores the new session.
    ///
    /// # Errors
    ///
    /// - `ApiError::Validation` if the form is incomplete.
    /// - `ApiError::Unauthorized` for wrong credentials.
    /// - `ApiError::MalformedResponse` if the server omitted the token or user.
    pub async fn login(&self, form: LoginRequest) -> ApiResult<UserProfile> {
        form.validate()?;
        info!(email = %form.email, "logging in");
        let request = ApiRequest::post(LOGIN_PATH)
            .with_json(&form)?
            .without_refresh();
        self.establish(request).await
    }

    /// Registers a new account and stores the new session.
    ///
    /// # Errors
    ///
    /// Same as [`login`](Self::login).
    pub async fn register(&self, form: RegisterRequest) -> ApiResult<UserProfile> {
        form.validate()?;
        info!(email = %form.email, "registering");
        let request = ApiRequest::post(REGISTER_PATH)
            .with_json(&form)?
            .without_refresh();
        self.establish(request).await
    }

    /// Ends the session.
    ///
    /// The server call is best effort: if it fails the local credentials
    /// are cleared anyway.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Storage` only if the local credentials could not
    /// be cleared.
    pub async fn logout(&self) -> ApiResult<()> {
        let request = ApiRequest::post(LOGOUT_PATH).without_refresh();
        if let Err(error) = self.client.send(request).await {
            warn!(%error, "logout call failed, continuing with local logout");
        }
        self.client.end_session().await?;
        info!("logged out");
        Ok(())
    }

    /// The profile of the stored session, if any.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Storage` if the store cannot be read.
    pub async fn current_user(&self) -> ApiResult<Option<UserProfile>> {
        Ok(self.client.session().user().await?)
    }

    async fn establish(&self, request: ApiRequest) -> ApiResult<UserProfile> {
        let payload: AuthPayload = self.client.send_json(request).await?;
        let session = payload.into_session().ok_or_else(|| {
            ApiError::MalformedResponse("missing access token or user".to_string())
        })?;
        self.client.session().save(&session).await?;
        info!(email = %session.user.email, "session stored");
        Ok(session.user)
    }
}

//! Authenticated API client
//!
//! Every business request to the backend goes through
//! [`AuthenticatedClient::send`], which runs three explicit stages:
//!
//! 1. `authorize` attaches the stored access token as a bearer credential.
//! 2. `dispatch` sends the request over the transport with a bounded timeout.
//! 3. `recover` turns a first 401 into a token refresh plus one retry.
//!
//! A request is retried at most once. A failed refresh clears the session
//! and sends the user to the login route.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use taskdeck_domain::{ApiRequest, ApiResponse};
use tracing::{debug, warn};

use crate::auth::{RefreshCoordinator, SessionStore};
use crate::error::{ApiError, ApiResult, RefreshError};
use crate::ports::{CredentialStoreError, Navigator, Transport, TransportError};

/// Where a request is in its lifecycle.
///
/// `INIT → DISPATCHED → {SUCCESS | UNAUTHORIZED}`, then for a refreshable
/// 401 `REFRESHING → {RETRIED_SUCCESS | RETRIED_FAILURE | LOGGED_OUT}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPhase {
    /// Built but not yet sent.
    Init,
    /// Sent, waiting for a response.
    Dispatched,
    /// Answered without needing a refresh.
    Success,
    /// Answered 401 and eligible for a refresh.
    Unauthorized,
    /// Waiting for a new access token.
    Refreshing,
    /// The retry produced a response.
    RetriedSuccess,
    /// The retry failed to produce a response.
    RetriedFailure,
    /// The refresh failed; the session was cleared.
    LoggedOut,
}

impl RequestPhase {
    /// Returns true if the request will not move again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Success | Self::RetriedSuccess | Self::RetriedFailure | Self::LoggedOut
        )
    }
}

/// Sends `request` with a bounded wait; an elapsed timeout is a transport error.
pub(crate) async fn dispatch(
    transport: &dyn Transport,
    request: &ApiRequest,
    timeout: Duration,
) -> Result<ApiResponse, TransportError> {
    let outcome = tokio::time::timeout(timeout, transport.execute(request)).await;
    let response = outcome.unwrap_or_else(|_| {
        Err(TransportError::Timeout {
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        })
    })?;
    debug!(
        request_id = %request.id,
        method = %request.method,
        path = %request.path,
        status = response.status,
        "response received"
    );
    Ok(response)
}

/// HTTP client that keeps requests authenticated.
///
/// # Example
///
/// ```ignore
/// let client = AuthenticatedClient::new(transport, session, navigator, Duration::from_secs(30));
/// let response = client.send(ApiRequest::get("/tasks")).await?;
/// ```
pub struct AuthenticatedClient {
    transport: Arc<dyn Transport>,
    session: SessionStore,
    refresher: RefreshCoordinator,
    timeout: Duration,
}

impl fmt::Debug for AuthenticatedClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticatedClient")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl AuthenticatedClient {
    /// Creates a client over `transport` using `session` for credentials.
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        session: SessionStore,
        navigator: Arc<dyn Navigator>,
        timeout: Duration,
    ) -> Self {
        let refresher = RefreshCoordinator::new(
            Arc::clone(&transport),
            session.clone(),
            navigator,
            timeout,
        );
        Self {
            transport,
            session,
            refresher,
            timeout,
        }
    }

    /// The session this client reads and writes.
    #[must_use]
    pub const fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Clears the stored credentials and the transport's session cookie.
    ///
    /// # Errors
    ///
    /// Returns an error if the credential store cannot be cleared.
    pub async fn end_session(&self) -> Result<(), CredentialStoreError> {
        self.transport.clear_session();
        self.session.clear().await
    }

    /// Sends a request, refreshing the access token once on a 401.
    ///
    /// # Errors
    ///
    /// - `ApiError::Transport` if no response arrived.
    /// - `ApiError::RefreshFailed` if the token expired and could not be
    ///   refreshed; the session has been cleared.
    /// - `ApiError::Unauthorized` for a 401 that was not recoverable.
    /// - `ApiError::Status` for any other non-2xx response.
    pub async fn send(&self, mut request: ApiRequest) -> ApiResult<ApiResponse> {
        trace_phase(&request, RequestPhase::Init);
        self.authorize(&mut request).await?;

        trace_phase(&request, RequestPhase::Dispatched);
        let response = dispatch(self.transport.as_ref(), &request, self.timeout).await?;

        let response = self.recover(request, response).await?;
        check_status(response)
    }

    /// Sends a request and decodes the JSON body of the response.
    ///
    /// # Errors
    ///
    /// Same as [`send`](Self::send), plus `ApiError::Decode` for a body that
    /// does not match `T`.
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> ApiResult<T> {
        let response = self.send(request).await?;
        Ok(response.json()?)
    }

    /// Refreshes the access token outside of a request.
    ///
    /// # Errors
    ///
    /// Returns the refresh failure; the session has been cleared.
    pub async fn refresh(&self) -> Result<String, RefreshError> {
        self.refresher.refresh().await
    }

    async fn authorize(&self, request: &mut ApiRequest) -> ApiResult<()> {
        match self.session.access_token().await? {
            Some(token) => request.set_bearer(&token),
            None => {
                debug!(request_id = %request.id, path = %request.path, "no access token, sending anonymously");
                request.clear_bearer();
            }
        }
        Ok(())
    }

    async fn recover(&self, mut request: ApiRequest, response: ApiResponse) -> ApiResult<ApiResponse> {
        if !response.is_unauthorized() || !request.can_refresh() {
            if response.is_success() {
                trace_phase(&request, RequestPhase::Success);
            }
            return Ok(response);
        }

        trace_phase(&request, RequestPhase::Unauthorized);
        request.retried = true;

        trace_phase(&request, RequestPhase::Refreshing);
        let token = match self.fresh_token(request.bearer_token()).await {
            Ok(token) => token,
            Err(error) => {
                trace_phase(&request, RequestPhase::LoggedOut);
                return Err(ApiError::RefreshFailed(error));
            }
        };

        request.set_bearer(&token);
        match dispatch(self.transport.as_ref(), &request, self.timeout).await {
            Ok(retried) => {
                trace_phase(&request, RequestPhase::RetriedSuccess);
                Ok(retried)
            }
            Err(error) => {
                trace_phase(&request, RequestPhase::RetriedFailure);
                warn!(request_id = %request.id, %error, "retry after refresh failed");
                Err(error.into())
            }
        }
    }

    /// A token newer than the one that was rejected.
    ///
    /// If another request already refreshed since `rejected` was read, the
    /// stored token is reused instead of refreshing again.
    async fn fresh_token(&self, rejected: Option<&str>) -> Result<String, RefreshError> {
        let stored = self
            .session
            .access_token()
            .await
            .map_err(|e| RefreshError::Storage(e.to_string()))?;
        match stored {
            Some(current) if Some(current.as_str()) != rejected => Ok(current),
            _ => self.refresher.refresh().await,
        }
    }
}

fn trace_phase(request: &ApiRequest, phase: RequestPhase) {
    debug!(
        request_id = %request.id,
        method = %request.method,
        path = %request.path,
        retried = request.retried,
        ?phase,
        "request phase"
    );
}

fn check_status(response: ApiResponse) -> ApiResult<ApiResponse> {
    if response.is_success() {
        Ok(response)
    } else if response.is_unauthorized() {
        Err(ApiError::Unauthorized(Box::new(response)))
    } else {
        Err(ApiError::Status(Box::new(response)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::auth::REFRESH_PATH;
    use crate::ports::LOGIN_ROUTE;
    use crate::test_support::{RecordingNavigator, ScriptedTransport, session_with_token};
    use pretty_assertions::assert_eq;

    const TASKS_OK: &str = r#"{"data":[],"meta":{"page":1,"limit":6,"total":0,"pages":0}}"#;

    async fn client(
        transport: &Arc<ScriptedTransport>,
        token: Option<&str>,
    ) -> (AuthenticatedClient, SessionStore, Arc<RecordingNavigator>) {
        let session = session_with_token(token).await;
        let navigator = Arc::new(RecordingNavigator::default());
        let client = AuthenticatedClient::new(
            transport.clone(),
            session.clone(),
            navigator.clone(),
            Duration::from_secs(5),
        );
        (client, session, navigator)
    }

    /// Backend where only `valid` is accepted and refresh yields `refreshed`.
    fn backend(valid: &'static str, refresh: Result<&'static str, u16>) -> ScriptedTransport {
        ScriptedTransport::new(move |request| {
            if request.path == REFRESH_PATH {
                return Ok(match refresh {
                    Ok(token) => ApiResponse::new(200, format!(r#"{{"accessToken":"{token}"}}"#)),
                    Err(status) => ApiResponse::new(status, ""),
                });
            }
            if request.bearer_token() == Some(valid) {
                Ok(ApiResponse::new(200, TASKS_OK))
            } else {
                Ok(ApiResponse::new(401, r#"{"message":"jwt expired"}"#))
            }
        })
    }

    #[tokio::test]
    async fn test_attaches_stored_token() {
        let transport = Arc::new(backend("tok", Ok("unused")));
        let (client, _, _) = client(&transport, Some("tok")).await;

        let response = client
            .send(ApiRequest::get("/tasks").with_query([("page", "1"), ("limit", "6")]))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, TASKS_OK);
        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].headers.get("Authorization"), Some("Bearer tok"));
        assert_eq!(transport.calls_to(REFRESH_PATH), 0);
    }

    #[tokio::test]
    async fn test_sends_anonymously_without_token() {
        let transport = Arc::new(ScriptedTransport::new(|_| Ok(ApiResponse::new(200, "{}"))));
        let (client, _, _) = client(&transport, None).await;

        client.send(ApiRequest::get("/tasks/stats")).await.unwrap();

        assert_eq!(transport.requests()[0].headers.get("Authorization"), None);
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed_and_retried_once() {
        let transport = Arc::new(backend("new123", Ok("new123")));
        let (client, session, navigator) = client(&transport, Some("old")).await;

        let response = client.send(ApiRequest::get("/tasks")).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(session.access_token().await.unwrap().as_deref(), Some("new123"));
        assert!(navigator.routes().is_empty());

        let sent = transport.requests();
        let paths: Vec<_> = sent.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["/tasks", REFRESH_PATH, "/tasks"]);
        assert_eq!(sent[0].bearer_token(), Some("old"));
        assert_eq!(sent[2].bearer_token(), Some("new123"));
        assert!(sent[2].retried);
    }

    #[tokio::test]
    async fn test_second_unauthorized_is_returned_without_another_retry() {
        // Refresh succeeds but the backend keeps rejecting the new token.
        let transport = Arc::new(backend("never", Ok("new123")));
        let (client, session, navigator) = client(&transport, Some("old")).await;

        let error = client.send(ApiRequest::get("/tasks")).await.unwrap_err();

        assert!(matches!(error, ApiError::Unauthorized(_)));
        assert_eq!(error.server_message().as_deref(), Some("jwt expired"));
        assert_eq!(transport.calls_to("/tasks"), 2);
        assert_eq!(transport.calls_to(REFRESH_PATH), 1);
        assert_eq!(session.access_token().await.unwrap().as_deref(), Some("new123"));
        assert!(navigator.routes().is_empty());
    }

    #[tokio::test]
    async fn test_failed_refresh_clears_session_and_navigates_to_login() {
        let transport = Arc::new(backend("new123", Err(401)));
        let (client, session, navigator) = client(&transport, Some("old")).await;

        let error = client.send(ApiRequest::get("/tasks")).await.unwrap_err();

        assert!(matches!(
            error,
            ApiError::RefreshFailed(RefreshError::Rejected { status: 401 })
        ));
        assert!(error.is_auth_failure());
        assert_eq!(session.access_token().await.unwrap(), None);
        assert_eq!(session.user().await.unwrap(), None);
        assert_eq!(navigator.routes(), vec![LOGIN_ROUTE.to_string()]);
        assert_eq!(transport.calls_to("/tasks"), 1);
    }

    #[tokio::test]
    async fn test_other_errors_pass_through() {
        let transport = Arc::new(ScriptedTransport::new(|_| {
            Ok(ApiResponse::new(404, r#"{"message":"Task not found"}"#))
        }));
        let (client, _, _) = client(&transport, Some("tok")).await;

        let error = client.send(ApiRequest::get("/tasks/missing")).await.unwrap_err();

        assert_eq!(error.status(), Some(404));
        assert_eq!(error.server_message().as_deref(), Some("Task not found"));
        assert_eq!(transport.calls_to(REFRESH_PATH), 0);
    }

    #[tokio::test]
    async fn test_opted_out_requests_do_not_refresh() {
        let transport = Arc::new(backend("tok", Ok("new123")));
        let (client, session, navigator) = client(&transport, None).await;

        let error = client
            .send(ApiRequest::post("/auth/login").without_refresh())
            .await
            .unwrap_err();

        assert!(matches!(error, ApiError::Unauthorized(_)));
        assert_eq!(transport.calls_to(REFRESH_PATH), 0);
        assert_eq!(session.access_token().await.unwrap(), None);
        assert!(navigator.routes().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_unauthorized_requests_refresh_once() {
        let transport = Arc::new(
            backend("new123", Ok("new123")).with_delay(REFRESH_PATH, Duration::from_millis(50)),
        );
        let (client, session, _) = client(&transport, Some("old")).await;

        let (first, second) = tokio::join!(
            client.send(ApiRequest::get("/tasks")),
            client.send(ApiRequest::get("/tasks/stats"))
        );

        assert_eq!(first.unwrap().status, 200);
        assert_eq!(second.unwrap().status, 200);
        assert_eq!(transport.calls_to(REFRESH_PATH), 1);
        assert_eq!(session.access_token().await.unwrap().as_deref(), Some("new123"));
    }

    #[tokio::test]
    async fn test_already_refreshed_token_is_reused() {
        let transport = Arc::new(backend("new123", Ok("unused")));
        let (client, session, _) = client(&transport, Some("new123")).await;

        // The request went out with a token that has since been replaced.
        let stale = ApiRequest::get("/tasks");
        let mut sent_with_old = stale.clone();
        sent_with_old.set_bearer("old");
        let response = ApiResponse::new(401, "");

        let recovered = client.recover(sent_with_old, response).await.unwrap();

        assert_eq!(recovered.status, 200);
        assert_eq!(transport.calls_to(REFRESH_PATH), 0);
        assert_eq!(session.access_token().await.unwrap().as_deref(), Some("new123"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_a_transport_error() {
        let transport = Arc::new(
            ScriptedTransport::new(|_| Ok(ApiResponse::new(200, "{}")))
                .with_delay("/tasks", Duration::from_secs(60)),
        );
        let session = session_with_token(Some("tok")).await;
        let client = AuthenticatedClient::new(
            transport,
            session,
            Arc::new(RecordingNavigator::default()),
            Duration::from_secs(1),
        );

        let error = client.send(ApiRequest::get("/tasks")).await.unwrap_err();

        assert!(matches!(
            error,
            ApiError::Transport(TransportError::Timeout { timeout_ms: 1000 })
        ));
    }

    #[tokio::test]
    async fn test_send_json_decodes_body() {
        let transport = Arc::new(ScriptedTransport::new(|_| {
            Ok(ApiResponse::new(
                200,
                r#"{"total":3,"completed":1,"inProgress":1,"open":1}"#,
            ))
        }));
        let (client, _, _) = client(&transport, Some("tok")).await;

        let stats: taskdeck_domain::TaskStats = client
            .send_json(ApiRequest::get("/tasks/stats"))
            .await
            .unwrap();

        assert_eq!(stats.total, 3);
    }

    #[test]
    fn test_terminal_phases() {
        assert!(RequestPhase::Success.is_terminal());
        assert!(RequestPhase::LoggedOut.is_terminal());
        assert!(!RequestPhase::Refreshing.is_terminal());
        assert!(!RequestPhase::Unauthorized.is_terminal());
    }
}

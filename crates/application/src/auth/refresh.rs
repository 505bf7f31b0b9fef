//! Single-flight access-token refresh.
//!
//! Any number of requests can hit a 401 at about the same time. Only the
//! first one starts a call to the refresh endpoint; the others await the
//! same shared future and observe the same outcome. The shared future
//! empties its slot as it resolves, before any waiter resumes, so a later
//! expiry always starts a new refresh.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use taskdeck_domain::{ApiRequest, RefreshPayload, token_preview};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::SessionStore;
use crate::client::dispatch;
use crate::error::RefreshError;
use crate::ports::{LOGIN_ROUTE, Navigator, Transport};

/// Path of the refresh endpoint.
pub const REFRESH_PATH: &str = "/auth/refresh";

type InFlight = Shared<BoxFuture<'static, Result<String, RefreshError>>>;

/// The refresh in flight, tagged so that only its own future releases it.
#[derive(Default)]
struct Slot {
    next_generation: u64,
    current: Option<(u64, InFlight)>,
}

/// Coalesces concurrent refreshes into one network call.
///
/// A successful refresh stores the new token before anyone waiting on it
/// resumes. A failed refresh clears the credential store and navigates
/// to the login route, once, no matter how many requests were waiting.
pub struct RefreshCoordinator {
    transport: Arc<dyn Transport>,
    session: SessionStore,
    navigator: Arc<dyn Navigator>,
    timeout: Duration,
    in_flight: Arc<Mutex<Slot>>,
}

impl fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl RefreshCoordinator {
    /// Creates a coordinator that refreshes over `transport`.
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        session: SessionStore,
        navigator: Arc<dyn Navigator>,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            session,
            navigator,
            timeout,
            in_flight: Arc::new(Mutex::new(Slot::default())),
        }
    }

    /// Refreshes the access token, joining a refresh already in flight.
    ///
    /// # Errors
    ///
    /// Returns the refresh failure; by then the session has been cleared.
    pub async fn refresh(&self) -> Result<String, RefreshError> {
        let shared = {
            let mut slot = self.in_flight.lock().await;
            if let Some((_, existing)) = slot.current.as_ref() {
                debug!("joining refresh already in flight");
                existing.clone()
            } else {
                let generation = slot.next_generation;
                slot.next_generation = generation.wrapping_add(1);
                let refresh = refresh_session(
                    Arc::clone(&self.transport),
                    self.session.clone(),
                    Arc::clone(&self.navigator),
                    self.timeout,
                );
                let in_flight = Arc::clone(&self.in_flight);
                let refresh = async move {
                    let outcome = refresh.await;
                    release(&in_flight, generation).await;
                    outcome
                }
                .boxed()
                .shared();
                slot.current = Some((generation, refresh.clone()));
                refresh
            }
        };

        shared.await
    }
}

async fn release(in_flight: &Mutex<Slot>, generation: u64) {
    let mut slot = in_flight.lock().await;
    if slot.current.as_ref().is_some_and(|(current, _)| *current == generation) {
        slot.current = None;
    }
}

async fn refresh_session(
    transport: Arc<dyn Transport>,
    session: SessionStore,
    navigator: Arc<dyn Navigator>,
    timeout: Duration,
) -> Result<String, RefreshError> {
    match request_token(transport.as_ref(), &session, timeout).await {
        Ok(token) => Ok(token),
        Err(error) => {
            warn!(%error, "token refresh failed, ending session");
            transport.clear_session();
            if let Err(clear_error) = session.clear().await {
                warn!(error = %clear_error, "could not clear credentials");
            }
            navigator.navigate(LOGIN_ROUTE);
            Err(error)
        }
    }
}

// Goes straight to the transport: a 401 here must never trigger another refresh.
async fn request_token(
    transport: &dyn Transport,
    session: &SessionStore,
    timeout: Duration,
) -> Result<String, RefreshError> {
    let request = ApiRequest::post(REFRESH_PATH).without_refresh();
    let response = dispatch(transport, &request, timeout).await?;

    if !response.is_success() {
        return Err(RefreshError::Rejected {
            status: response.status,
        });
    }

    let token = response
        .json::<RefreshPayload>()
        .map_err(|e| RefreshError::MalformedResponse(e.to_string()))?
        .into_token()
        .ok_or_else(|| {
            RefreshError::MalformedResponse("no access token in refresh response".to_string())
        })?;

    session
        .set_access_token(&token)
        .await
        .map_err(|e| RefreshError::Storage(e.to_string()))?;

    info!(token = %token_preview(&token), "access token refreshed");
    Ok(token)
}

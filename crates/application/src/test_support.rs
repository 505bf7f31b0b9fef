//! Test doubles shared by the unit tests of this crate.

#![allow(clippy::unwrap_used, clippy::expect_used, missing_docs)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use taskdeck_domain::{ApiRequest, ApiResponse, Session, UserProfile};

use crate::auth::{MemoryCredentialStore, SessionStore};
use crate::ports::{Navigator, Transport, TransportError};

type Handler = dyn Fn(&ApiRequest) -> Result<ApiResponse, TransportError> + Send + Sync;

/// Transport answering from a closure and recording every request it sees.
pub(crate) struct ScriptedTransport {
    handler: Box<Handler>,
    delays: HashMap<String, Duration>,
    requests: Mutex<Vec<ApiRequest>>,
    sessions_cleared: AtomicUsize,
}

impl ScriptedTransport {
    pub(crate) fn new<F>(handler: F) -> Self
    where
        F: Fn(&ApiRequest) -> Result<ApiResponse, TransportError> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            delays: HashMap::new(),
            requests: Mutex::new(Vec::new()),
            sessions_cleared: AtomicUsize::new(0),
        }
    }

    /// Holds responses for `path` back by `delay`.
    pub(crate) fn with_delay(mut self, path: &str, delay: Duration) -> Self {
        self.delays.insert(path.to_string(), delay);
        self
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// How many times the session cookie was dropped.
    pub(crate) fn sessions_cleared(&self) -> usize {
        self.sessions_cleared.load(Ordering::SeqCst)
    }

    pub(crate) fn calls_to(&self, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path == path)
            .count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delays.get(&request.path) {
            tokio::time::sleep(*delay).await;
        }
        (self.handler)(request)
    }

    fn clear_session(&self) {
        self.sessions_cleared.fetch_add(1, Ordering::SeqCst);
    }
}

/// Navigator remembering where it was sent.
#[derive(Default)]
pub(crate) struct RecordingNavigator {
    routes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub(crate) fn routes(&self) -> Vec<String> {
        self.routes.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: &str) {
        self.routes.lock().unwrap().push(route.to_string());
    }
}

pub(crate) fn profile() -> UserProfile {
    UserProfile {
        id: "u1".to_string(),
        email: "ada@example.com".to_string(),
        name: "Ada".to_string(),
    }
}

/// A session store holding `token` (and a profile) or nothing at all.
pub(crate) async fn session_with_token(token: Option<&str>) -> SessionStore {
    let session = SessionStore::new(Arc::new(MemoryCredentialStore::new()));
    if let Some(token) = token {
        session.save(&Session::new(token, profile())).await.unwrap();
    }
    session
}

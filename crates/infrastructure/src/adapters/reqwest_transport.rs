//! Transport implementation using reqwest.
//!
//! This adapter implements the `Transport` port. It resolves request paths
//! against the API base URL and keeps a cookie jar so the server's
//! HTTP-only session cookie travels with every call, refresh included.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, Url};
use taskdeck_application::{Transport, TransportError};
use taskdeck_domain::{ApiRequest, ApiResponse, Headers, HttpMethod};
use tracing::{debug, trace};

use crate::persistence::CookieJar;

const JSON: &str = "application/json";

/// Transport over a cookie-carrying `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    cookies: Arc<CookieJar>,
    base_url: Url,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Creates a transport for the API at `base_url` with an in-memory
    /// cookie jar.
    ///
    /// Default configuration:
    /// - Cookie store: in memory
    /// - Follow redirects: up to 10
    /// - User-Agent: "taskdeck/<version>"
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, TransportError> {
        Self::with_cookie_jar(base_url, timeout, Arc::new(CookieJar::in_memory()))
    }

    /// Creates a transport that keeps its cookies in `cookies`.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn with_cookie_jar(
        base_url: Url,
        timeout: Duration,
        cookies: Arc<CookieJar>,
    ) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(concat!("taskdeck/", env!("CARGO_PKG_VERSION")))
            .cookie_provider(Arc::clone(&cookies))
            .redirect(reqwest::redirect::Policy::limited(10))
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;

        Ok(Self {
            client,
            cookies,
            base_url,
            timeout,
        })
    }

    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    /// Appends `path` to the base URL, keeping any base path prefix.
    fn resolve(&self, request: &ApiRequest) -> Result<Url, TransportError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = request.path.trim_start_matches('/');
        let raw = format!("{base}/{path}");
        let mut url =
            Url::parse(&raw).map_err(|e| TransportError::InvalidUrl(format!("{e}: {raw}")))?;

        if !request.query.is_empty() {
            let query = serde_urlencoded::to_string(&request.query)
                .map_err(|e| TransportError::InvalidUrl(e.to_string()))?;
            url.set_query(Some(&query));
        }
        Ok(url)
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }

    fn map_error(&self, error: &reqwest::Error) -> TransportError {
        if error.is_timeout() {
            return TransportError::Timeout {
                timeout_ms: self.timeout_ms(),
            };
        }

        if error.is_connect() {
            let host = error
                .url()
                .and_then(Url::host_str)
                .unwrap_or("unknown")
                .to_string();
            return TransportError::ConnectionFailed(format!("{host}: {error}"));
        }

        if error.is_redirect() {
            return TransportError::Other("too many redirects (max 10)".to_string());
        }

        TransportError::Other(error.to_string())
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = self.resolve(request)?;
        let start = Instant::now();

        let mut builder = self
            .client
            .request(Self::to_reqwest_method(request.method), url)
            .header(CONTENT_TYPE, JSON)
            .header(ACCEPT, JSON);

        for header in request.headers.iter() {
            builder = builder.header(&header.name, &header.value);
        }

        if let Some(body) = &request.body {
            let bytes =
                serde_json::to_vec(body).map_err(|e| TransportError::Other(e.to_string()))?;
            builder = builder.body(bytes);
        }

        let response = builder.send().await.map_err(|e| self.map_error(&e))?;
        let status = response.status().as_u16();

        let headers: Headers = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("<binary>").to_string()))
            .collect();

        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Other(format!("failed to read body: {e}")))?;

        let duration = start.elapsed();
        trace!(request_id = %request.id, status, ?duration, "transport round trip");

        Ok(ApiResponse {
            status,
            headers,
            body,
            duration,
        })
    }

    fn clear_session(&self) {
        self.cookies.clear();
        debug!("session cookies cleared");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use pretty_assertions::assert_eq;

    fn transport(url: &str) -> ReqwestTransport {
        ReqwestTransport::new(Url::parse(url).unwrap(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_to_reqwest_method() {
        assert_eq!(
            ReqwestTransport::to_reqwest_method(HttpMethod::Get),
            Method::GET
        );
        assert_eq!(
            ReqwestTransport::to_reqwest_method(HttpMethod::Patch),
            Method::PATCH
        );
        assert_eq!(
            ReqwestTransport::to_reqwest_method(HttpMethod::Delete),
            Method::DELETE
        );
    }

    #[test]
    fn test_resolve_keeps_base_path_and_encodes_query() {
        let transport = transport("http://localhost:3000/api/");
        let request = ApiRequest::get("/tasks").with_query([("search", "a&b c"), ("page", "2")]);

        let url = transport.resolve(&request).unwrap();

        assert_eq!(
            url.as_str(),
            "http://localhost:3000/api/tasks?search=a%26b+c&page=2"
        );
    }

    #[tokio::test]
    async fn test_sends_json_headers_and_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/tasks")
            .match_header("content-type", JSON)
            .match_header("authorization", "Bearer tok")
            .match_body(Matcher::Json(serde_json::json!({ "title": "Ship it" })))
            .with_status(201)
            .with_header("content-type", JSON)
            .with_body(r#"{"id":"t1"}"#)
            .create_async()
            .await;

        let mut request = ApiRequest::post("/tasks")
            .with_json(&serde_json::json!({ "title": "Ship it" }))
            .unwrap();
        request.set_bearer("tok");

        let response = transport(&server.url()).execute(&request).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.status, 201);
        assert_eq!(response.body, r#"{"id":"t1"}"#);
        assert_eq!(response.headers.get("Content-Type"), Some(JSON));
    }

    #[tokio::test]
    async fn test_error_statuses_are_responses() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/tasks/stats")
            .with_status(401)
            .with_body(r#"{"message":"jwt expired"}"#)
            .create_async()
            .await;

        let response = transport(&server.url())
            .execute(&ApiRequest::get("/tasks/stats"))
            .await
            .unwrap();

        assert!(response.is_unauthorized());
        assert_eq!(response.message().as_deref(), Some("jwt expired"));
    }

    #[tokio::test]
    async fn test_session_cookie_is_carried_to_later_calls() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/auth/login")
            .with_status(200)
            .with_header("set-cookie", "refreshToken=r1; Path=/; HttpOnly")
            .with_body("{}")
            .create_async()
            .await;
        let refresh = server
            .mock("POST", "/auth/refresh")
            .match_header("cookie", "refreshToken=r1")
            .with_status(200)
            .with_body(r#"{"accessToken":"new"}"#)
            .create_async()
            .await;

        let transport = transport(&server.url());
        transport
            .execute(&ApiRequest::post("/auth/login"))
            .await
            .unwrap();
        let response = transport
            .execute(&ApiRequest::post("/auth/refresh"))
            .await
            .unwrap();

        refresh.assert_async().await;
        assert_eq!(response.status, 200);
    }

    #[tokio::test]
    async fn test_cleared_session_sends_no_cookie() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/auth/login")
            .with_status(200)
            .with_header("set-cookie", "refreshToken=r1; Path=/; HttpOnly")
            .with_body("{}")
            .create_async()
            .await;
        let refresh = server
            .mock("POST", "/auth/refresh")
            .match_header("cookie", Matcher::Missing)
            .with_status(401)
            .create_async()
            .await;

        let transport = transport(&server.url());
        transport
            .execute(&ApiRequest::post("/auth/login"))
            .await
            .unwrap();
        transport.clear_session();
        let response = transport
            .execute(&ApiRequest::post("/auth/refresh"))
            .await
            .unwrap();

        refresh.assert_async().await;
        assert_eq!(response.status, 401);
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let error = transport("http://127.0.0.1:1")
            .execute(&ApiRequest::get("/tasks"))
            .await
            .unwrap_err();

        assert!(matches!(error, TransportError::ConnectionFailed(_)));
    }
}

//! Authenticated request execution.
//!
//! Every API call goes through `AuthenticatedExecutor::execute`, which
//! attaches the stored bearer token and recovers from one rejected token per
//! call:
//!
//! ```text
//! Init -> Attempt1 -> Success | NonAuthError | AuthError
//! AuthError -> refresh (joined or new) -> RetrySuccess
//!                                       | RetryAuthError -> SessionExpired
//!                                       | RefreshFailed  -> SessionExpired
//! ```

use std::sync::Arc;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::redirect::{LoginRedirect, Navigator};
use super::request::RequestDescriptor;
use super::transport::{HttpRequest, HttpResponse, Transport};
use super::ApiError;
use crate::auth::{Credential, RefreshCoordinator, TokenStore};

/// Successful response, handed back exactly as received.
#[derive(Debug, Clone)]
pub struct Payload {
    pub status: StatusCode,
    pub body: String,
}

impl Payload {
    /// Decode the body; an empty body (204) decodes as JSON `null`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        let body = if self.body.trim().is_empty() {
            "null"
        } else {
            self.body.as_str()
        };
        serde_json::from_str(body)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }
}

pub struct AuthenticatedExecutor {
    transport: Arc<dyn Transport>,
    store: Arc<dyn TokenStore>,
    refresher: RefreshCoordinator,
    redirect: LoginRedirect,
}

impl AuthenticatedExecutor {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
        refresh_path: impl Into<String>,
    ) -> Self {
        let refresher =
            RefreshCoordinator::new(Arc::clone(&transport), Arc::clone(&store), refresh_path);
        Self {
            transport,
            store,
            refresher,
            redirect: LoginRedirect::new(navigator),
        }
    }

    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    pub fn refresher(&self) -> &RefreshCoordinator {
        &self.refresher
    }

    /// Save credentials from a fresh login and allow the next expiry to
    /// redirect again.
    pub fn store_credentials(&self, credential: Credential) {
        self.store.save(credential);
        self.redirect.rearm();
    }

    pub fn sign_out(&self) {
        self.store.clear();
    }

    pub async fn execute(&self, descriptor: &RequestDescriptor) -> Result<Payload, ApiError> {
        if !descriptor.requires_auth {
            let response = self.send(descriptor, None).await?;
            return Self::finish(response);
        }

        let token = self.store.read().ok_or_else(|| {
            debug!(path = %descriptor.path, "No access token, not sending request");
            ApiError::Unauthenticated
        })?;

        let response = self.send(descriptor, Some(token.clone())).await?;
        if response.status != StatusCode::UNAUTHORIZED || !descriptor.renew_session {
            return Self::finish(response);
        }

        debug!(path = %descriptor.path, "Access token rejected");
        let fresh = match self.store.read() {
            // Someone else already refreshed while this request was out
            Some(current) if current != token => current,
            _ => match self.refresher.refresh().await {
                Ok(fresh) => fresh,
                Err(e) => {
                    warn!(path = %descriptor.path, error = %e, "Session could not be renewed");
                    return Err(self.expire());
                }
            },
        };

        let retry = self.send(descriptor, Some(fresh)).await?;
        if retry.status == StatusCode::UNAUTHORIZED {
            warn!(path = %descriptor.path, "Renewed token rejected");
            return Err(self.expire());
        }
        Self::finish(retry)
    }

    /// Execute and decode the JSON body.
    pub async fn execute_json<T: DeserializeOwned>(
        &self,
        descriptor: &RequestDescriptor,
    ) -> Result<T, ApiError> {
        self.execute(descriptor).await?.json()
    }

    async fn send(
        &self,
        descriptor: &RequestDescriptor,
        bearer: Option<String>,
    ) -> Result<HttpResponse, ApiError> {
        let request = HttpRequest {
            method: descriptor.method.clone(),
            path: descriptor.path.clone(),
            bearer,
            body: descriptor.body.clone(),
        };
        self.transport
            .send(request)
            .await
            .map_err(|e| ApiError::RequestFailed {
                status: None,
                body: e.to_string(),
            })
    }

    fn finish(response: HttpResponse) -> Result<Payload, ApiError> {
        if response.status.is_success() {
            Ok(Payload {
                status: response.status,
                body: response.body,
            })
        } else {
            Err(ApiError::RequestFailed {
                status: Some(response.status),
                body: response.body,
            })
        }
    }

    fn expire(&self) -> ApiError {
        self.store.clear();
        self.redirect.fire();
        ApiError::SessionExpired
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::api::redirect::NoopNavigator;
    use crate::api::transport::TransportError;
    use crate::auth::{MemoryTokenStore, DEFAULT_REFRESH_PATH};
    use crate::testing::{bearer, respond, store_with, MockTransport};

    #[derive(Default)]
    struct CountingNavigator(AtomicUsize);

    impl Navigator for CountingNavigator {
        fn redirect_to_login(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl CountingNavigator {
        fn count(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn executor(
        transport: Arc<MockTransport>,
        store: Arc<dyn TokenStore>,
        navigator: Arc<CountingNavigator>,
    ) -> AuthenticatedExecutor {
        AuthenticatedExecutor::new(transport, store, navigator, DEFAULT_REFRESH_PATH)
    }

    /// Backend where `/assets/` only accepts `A2` and refresh hands out `A2`.
    fn expiring_backend() -> MockTransport {
        MockTransport::new(|req| match (req.path.as_str(), bearer(req)) {
            (DEFAULT_REFRESH_PATH, _) => respond(200, serde_json::json!({"access": "A2"})),
            ("/assets/", Some("A2")) => respond(200, serde_json::json!([{"id": 1}, {"id": 2}])),
            _ => respond(401, serde_json::json!({"detail": "Given token not valid"})),
        })
    }

    #[tokio::test]
    async fn test_success_returns_payload_unchanged() {
        let body = serde_json::json!([{"id": 1, "name": "Laptop"}]);
        let expected = body.to_string();
        let transport = Arc::new(MockTransport::new(move |req| {
            assert_eq!(bearer(req), Some("A1"));
            respond(200, body.clone())
        }));
        let nav = Arc::new(CountingNavigator::default());
        let exec = executor(transport.clone(), store_with("A1", "R1"), nav.clone());

        let payload = exec.execute(&RequestDescriptor::get("/assets/")).await.unwrap();
        assert_eq!(payload.status, StatusCode::OK);
        assert_eq!(payload.body, expected);
        assert_eq!(transport.calls().len(), 1);
        assert_eq!(nav.count(), 0);
    }

    #[tokio::test]
    async fn test_missing_token_fails_without_network() {
        let transport = Arc::new(MockTransport::new(|_| respond(200, serde_json::json!([]))));
        let exec = executor(
            transport.clone(),
            Arc::new(MemoryTokenStore::new()),
            Arc::new(CountingNavigator::default()),
        );

        let err = exec.execute(&RequestDescriptor::get("/assets/")).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_then_retry_succeeds() {
        let transport = Arc::new(expiring_backend());
        let store = store_with("A1", "R1");
        let nav = Arc::new(CountingNavigator::default());
        let exec = executor(transport.clone(), store.clone(), nav.clone());

        let assets: serde_json::Value = exec
            .execute_json(&RequestDescriptor::get("/assets/"))
            .await
            .unwrap();
        assert_eq!(assets, serde_json::json!([{"id": 1}, {"id": 2}]));
        assert_eq!(store.read().as_deref(), Some("A2"));

        let calls = transport.calls();
        let tokens: Vec<_> = calls
            .iter()
            .map(|c| (c.path.as_str(), bearer(c)))
            .collect();
        assert_eq!(
            tokens,
            vec![
                ("/assets/", Some("A1")),
                (DEFAULT_REFRESH_PATH, None),
                ("/assets/", Some("A2")),
            ]
        );
        assert_eq!(nav.count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_401s_collapse_into_one_refresh() {
        let transport = Arc::new(
            expiring_backend().with_latency(DEFAULT_REFRESH_PATH, Duration::from_millis(50)),
        );
        let store = store_with("A1", "R1");
        let exec = executor(
            transport.clone(),
            store.clone(),
            Arc::new(CountingNavigator::default()),
        );

        let descriptor = RequestDescriptor::get("/assets/");
        let results = futures::future::join_all((0..8).map(|_| exec.execute(&descriptor))).await;

        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(transport.calls_to(DEFAULT_REFRESH_PATH), 1);
        assert_eq!(exec.refresher().refresh_calls(), 1);

        let retries: Vec<_> = transport
            .calls()
            .into_iter()
            .filter(|c| c.path == "/assets/" && c.bearer.as_deref() != Some("A1"))
            .collect();
        assert_eq!(retries.len(), 8);
        assert!(retries.iter().all(|c| c.bearer.as_deref() == Some("A2")));
    }

    #[tokio::test]
    async fn test_second_401_expires_session_and_redirects_once() {
        let transport = Arc::new(
            MockTransport::new(|req| match req.path.as_str() {
                DEFAULT_REFRESH_PATH => respond(200, serde_json::json!({"access": "A2"})),
                _ => respond(401, serde_json::json!({"detail": "nope"})),
            })
            .with_latency(DEFAULT_REFRESH_PATH, Duration::from_millis(20)),
        );
        let store = store_with("A1", "R1");
        let nav = Arc::new(CountingNavigator::default());
        let exec = executor(transport.clone(), store.clone(), nav.clone());

        let descriptor = RequestDescriptor::get("/users/me/");
        let results = futures::future::join_all((0..5).map(|_| exec.execute(&descriptor))).await;

        assert!(results
            .iter()
            .all(|r| matches!(r, Err(ApiError::SessionExpired))));
        assert_eq!(nav.count(), 1);
        assert_eq!(store.credential(), None);
        // First attempt plus exactly one retry per call
        assert_eq!(transport.calls_to("/users/me/"), 10);
    }

    #[tokio::test]
    async fn test_refresh_failure_expires_session() {
        let transport = Arc::new(MockTransport::new(|req| match req.path.as_str() {
            DEFAULT_REFRESH_PATH => respond(401, serde_json::json!({"detail": "expired"})),
            _ => respond(401, serde_json::json!({})),
        }));
        let store = store_with("A1", "R1");
        let nav = Arc::new(CountingNavigator::default());
        let exec = executor(transport.clone(), store.clone(), nav.clone());

        let err = exec.execute(&RequestDescriptor::get("/assets/")).await.unwrap_err();
        assert!(matches!(err, ApiError::SessionExpired));
        assert_eq!(store.read(), None);
        assert_eq!(nav.count(), 1);
        assert_eq!(transport.calls_to("/assets/"), 1);

        // With the store cleared the next call never reaches the network
        let err = exec.execute(&RequestDescriptor::get("/assets/")).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated));
        assert_eq!(transport.calls_to("/assets/"), 1);
    }

    #[tokio::test]
    async fn test_no_refresh_token_expires_session() {
        let transport = Arc::new(MockTransport::new(|_| respond(401, serde_json::json!({}))));
        let store = store_with("A1", "");
        let nav = Arc::new(CountingNavigator::default());
        let exec = executor(transport.clone(), store.clone(), nav.clone());

        let err = exec.execute(&RequestDescriptor::get("/assets/")).await.unwrap_err();
        assert!(matches!(err, ApiError::SessionExpired));
        assert_eq!(transport.calls_to(DEFAULT_REFRESH_PATH), 0);
        assert_eq!(store.read(), None);
        assert_eq!(nav.count(), 1);
    }

    #[tokio::test]
    async fn test_server_error_passes_through_without_refresh() {
        let transport = Arc::new(MockTransport::new(|_| {
            respond(500, serde_json::json!({"error": "boom"}))
        }));
        let store = store_with("A1", "R1");
        let exec = executor(transport.clone(), store.clone(), Arc::new(CountingNavigator::default()));

        match exec.execute(&RequestDescriptor::get("/assets/")).await {
            Err(ApiError::RequestFailed { status, body }) => {
                assert_eq!(status, Some(StatusCode::INTERNAL_SERVER_ERROR));
                assert_eq!(body, r#"{"error":"boom"}"#);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(transport.calls().len(), 1);
        assert_eq!(exec.refresher().refresh_calls(), 0);
        assert_eq!(store.read().as_deref(), Some("A1"));
    }

    #[tokio::test]
    async fn test_network_fault_is_request_failed() {
        let transport = Arc::new(MockTransport::new(|_| {
            Err(TransportError("timed out".to_string()))
        }));
        let exec = executor(transport, store_with("A1", "R1"), Arc::new(CountingNavigator::default()));

        match exec.execute(&RequestDescriptor::get("/assets/")).await {
            Err(ApiError::RequestFailed { status: None, body }) => assert_eq!(body, "timed out"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_public_request_skips_token_and_refresh() {
        let transport = Arc::new(MockTransport::new(|req| {
            assert!(req.bearer.is_none());
            respond(401, serde_json::json!({"detail": "No active account"}))
        }));
        let exec = executor(
            transport.clone(),
            store_with("A1", "R1"),
            Arc::new(CountingNavigator::default()),
        );

        let login = RequestDescriptor::post("/token/").public();
        match exec.execute(&login).await {
            Err(ApiError::RequestFailed { status, .. }) => {
                assert_eq!(status, Some(StatusCode::UNAUTHORIZED))
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_no_refresh_request_leaves_dead_session_alone() {
        let transport = Arc::new(MockTransport::new(|_| respond(401, serde_json::json!({}))));
        let store = store_with("A1", "R1");
        let nav = Arc::new(CountingNavigator::default());
        let exec = executor(transport.clone(), store.clone(), nav.clone());

        let logout = RequestDescriptor::post("/logout/").no_refresh();
        let err = exec.execute(&logout).await.unwrap_err();

        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
        assert!(!err.is_auth_failure());
        assert_eq!(transport.calls()[0].bearer.as_deref(), Some("A1"));
        assert_eq!(transport.calls().len(), 1);
        assert_eq!(exec.refresher().refresh_calls(), 0);
        assert_eq!(nav.count(), 0);
        assert_eq!(store.read().as_deref(), Some("A1"));
    }

    #[tokio::test]
    async fn test_login_rearms_redirect() {
        let transport = Arc::new(MockTransport::new(|req| match req.path.as_str() {
            DEFAULT_REFRESH_PATH => respond(401, serde_json::json!({})),
            _ => respond(401, serde_json::json!({})),
        }));
        let store = Arc::new(MemoryTokenStore::new());
        let nav = Arc::new(CountingNavigator::default());
        let exec = executor(transport, store, nav.clone());

        exec.store_credentials(Credential::new("A1", "R1"));
        let _ = exec.execute(&RequestDescriptor::get("/assets/")).await;
        exec.store_credentials(Credential::new("A3", "R3"));
        let _ = exec.execute(&RequestDescriptor::get("/assets/")).await;

        assert_eq!(nav.count(), 2);
    }

    #[tokio::test]
    async fn test_empty_body_decodes_as_unit() {
        let transport = Arc::new(MockTransport::new(|_| {
            Ok(HttpResponse::new(StatusCode::NO_CONTENT, ""))
        }));
        let exec = AuthenticatedExecutor::new(
            transport,
            store_with("A1", "R1"),
            Arc::new(NoopNavigator),
            DEFAULT_REFRESH_PATH,
        );

        exec.execute_json::<()>(&RequestDescriptor::delete("/assets/3/"))
            .await
            .unwrap();
    }
}

//! Scripted in-memory backend for unit tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use reqwest::StatusCode;

use crate::api::transport::{HttpRequest, HttpResponse, Transport, TransportError};
use crate::auth::{Credential, MemoryTokenStore, TokenStore};

type Handler = dyn Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync;

pub(crate) struct MockTransport {
    handler: Box<Handler>,
    calls: Mutex<Vec<HttpRequest>>,
    slow_path: Option<(String, Duration)>,
}

impl MockTransport {
    pub(crate) fn new(
        handler: impl Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
            slow_path: None,
        }
    }

    /// Delay responses for one path so concurrent callers overlap.
    pub(crate) fn with_latency(mut self, path: &str, latency: Duration) -> Self {
        self.slow_path = Some((path.to_string(), latency));
        self
    }

    pub(crate) fn calls(&self) -> Vec<HttpRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn calls_to(&self, path: &str) -> usize {
        self.calls().iter().filter(|c| c.path == path).count()
    }
}

impl Transport for MockTransport {
    fn send(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse, TransportError>> {
        async move {
            self.calls.lock().unwrap().push(request.clone());
            if let Some((ref path, latency)) = self.slow_path {
                if *path == request.path {
                    tokio::time::sleep(latency).await;
                }
            }
            (self.handler)(&request)
        }
        .boxed()
    }
}

pub(crate) fn respond(status: u16, body: serde_json::Value) -> Result<HttpResponse, TransportError> {
    Ok(HttpResponse::new(
        StatusCode::from_u16(status).unwrap(),
        body.to_string(),
    ))
}

pub(crate) fn store_with(access: &str, refresh: &str) -> Arc<MemoryTokenStore> {
    let store = Arc::new(MemoryTokenStore::new());
    store.save(Credential::new(access, refresh));
    store
}

/// The token a request carried, for asserting on retries.
pub(crate) fn bearer(request: &HttpRequest) -> Option<&str> {
    request.bearer.as_deref()
}

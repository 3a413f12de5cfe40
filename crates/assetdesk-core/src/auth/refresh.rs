//! Single-flight access token refresh.
//!
//! Concurrent callers that find their token rejected all end up awaiting the
//! same shared future, so a burst of 401s produces exactly one call to the
//! refresh endpoint. The slot is emptied once that exchange settles and the
//! next refresh starts a new epoch.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use reqwest::Method;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::store::TokenStore;
use crate::api::error::truncate_body;
use crate::api::transport::{HttpRequest, Transport};
use crate::models::RefreshResponse;

/// Refresh endpoint of the backend's JWT views.
pub const DEFAULT_REFRESH_PATH: &str = "/token/refresh/";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    #[error("No refresh token stored")]
    NoRefreshToken,

    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),
}

type RefreshFuture = Shared<BoxFuture<'static, Result<String, RefreshError>>>;

struct InFlight {
    epoch: u64,
    future: RefreshFuture,
}

pub struct RefreshCoordinator {
    transport: Arc<dyn Transport>,
    store: Arc<dyn TokenStore>,
    refresh_path: String,
    in_flight: Mutex<Option<InFlight>>,
    epochs: AtomicU64,
    exchanges: Arc<AtomicUsize>,
}

impl RefreshCoordinator {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<dyn TokenStore>,
        refresh_path: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            store,
            refresh_path: refresh_path.into(),
            in_flight: Mutex::new(None),
            epochs: AtomicU64::new(0),
            exchanges: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Obtain a new access token, joining a refresh already in progress.
    ///
    /// On failure the store has been cleared and the caller must send the
    /// user back to log in.
    pub async fn refresh(&self) -> Result<String, RefreshError> {
        let (epoch, future) = self.join_or_start();
        let result = future.await;
        self.settle(epoch);
        result
    }

    /// Number of refresh requests actually sent to the backend.
    pub fn refresh_calls(&self) -> usize {
        self.exchanges.load(Ordering::SeqCst)
    }

    pub fn is_refreshing(&self) -> bool {
        self.slot().is_some()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<InFlight>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn join_or_start(&self) -> (u64, RefreshFuture) {
        let mut slot = self.slot();
        if let Some(ref in_flight) = *slot {
            debug!(epoch = in_flight.epoch, "Joining in-flight token refresh");
            return (in_flight.epoch, in_flight.future.clone());
        }

        let epoch = self.epochs.fetch_add(1, Ordering::SeqCst) + 1;
        let future = exchange(
            Arc::clone(&self.transport),
            Arc::clone(&self.store),
            self.refresh_path.clone(),
            Arc::clone(&self.exchanges),
        )
        .boxed()
        .shared();
        *slot = Some(InFlight {
            epoch,
            future: future.clone(),
        });
        debug!(epoch, "Started token refresh");
        (epoch, future)
    }

    fn settle(&self, epoch: u64) {
        let mut slot = self.slot();
        if slot.as_ref().map(|f| f.epoch) == Some(epoch) {
            *slot = None;
        }
    }
}

async fn exchange(
    transport: Arc<dyn Transport>,
    store: Arc<dyn TokenStore>,
    refresh_path: String,
    exchanges: Arc<AtomicUsize>,
) -> Result<String, RefreshError> {
    let Some(refresh_token) = store.refresh_token().filter(|t| !t.is_empty()) else {
        warn!("No refresh token available, clearing session");
        store.clear();
        return Err(RefreshError::NoRefreshToken);
    };

    exchanges.fetch_add(1, Ordering::SeqCst);
    let request = HttpRequest {
        method: Method::POST,
        path: refresh_path,
        bearer: None,
        body: Some(serde_json::json!({ "refresh": refresh_token })),
    };

    let outcome = match transport.send(request).await {
        Ok(response) if response.status.is_success() => {
            serde_json::from_str::<RefreshResponse>(&response.body)
                .map_err(|e| RefreshError::RefreshFailed(format!("Invalid refresh response: {}", e)))
        }
        Ok(response) => Err(RefreshError::RefreshFailed(format!(
            "Status {}: {}",
            response.status,
            truncate_body(&response.body)
        ))),
        Err(e) => Err(RefreshError::RefreshFailed(e.to_string())),
    };

    match outcome {
        Ok(refreshed) => {
            let rotated = refreshed.rotates();
            let credential = refreshed.into_credential(&refresh_token);
            let access = credential.access_token.clone();
            store.save(credential);
            info!(rotated, "Access token refreshed");
            Ok(access)
        }
        Err(e) => {
            warn!(error = %e, "Token refresh failed, clearing session");
            store.clear();
            Err(e)
        }
    }
}

use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// An access/refresh token pair as issued by the backend.
///
/// Serialized with the fixed key names the web client used for its
/// session storage (`token`, `refreshToken`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    #[serde(rename = "token")]
    pub access_token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
    #[serde(rename = "expiresAt", default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            expires_at: None,
        }
    }

    pub fn with_expiry(mut self, expires_at: Option<DateTime<Utc>>) -> Self {
        self.expires_at = expires_at;
        self
    }

    /// True once the known expiry has passed. A credential without an
    /// expiry is never considered expired locally; the server decides.
    pub fn is_expired(&self) -> bool {
        self.expires_at.map(|at| Utc::now() > at).unwrap_or(false)
    }

    pub fn expires_in(&self) -> Option<Duration> {
        self.expires_at.map(|at| at - Utc::now())
    }
}

/// Session-scoped holder of the current credential pair.
///
/// Writes always replace the whole pair so readers never observe an access
/// token from one login next to a refresh token from another. Backends that
/// fail behave as if nothing is stored.
pub trait TokenStore: Send + Sync {
    fn save(&self, credential: Credential);

    fn credential(&self) -> Option<Credential>;

    fn clear(&self);

    /// Current access token, if any.
    fn read(&self) -> Option<String> {
        self.credential().map(|c| c.access_token)
    }

    fn refresh_token(&self) -> Option<String> {
        self.credential().map(|c| c.refresh_token)
    }
}

/// In-process store, lives as long as the client does.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    inner: RwLock<Option<Credential>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn save(&self, credential: Credential) {
        match self.inner.write() {
            Ok(mut guard) => *guard = Some(credential),
            Err(poisoned) => {
                warn!("Token store lock poisoned, overwriting");
                *poisoned.into_inner() = Some(credential);
            }
        }
    }

    fn credential(&self) -> Option<Credential> {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(_) => None,
        }
    }

    fn clear(&self) {
        match self.inner.write() {
            Ok(mut guard) => *guard = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
    }
}

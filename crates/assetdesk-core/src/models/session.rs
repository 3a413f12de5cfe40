use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::Credential;

/// Body of a successful `POST /token/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
    /// Seconds until the access token expires, when the backend says so.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
}

impl TokenPair {
    pub fn into_credential(self) -> Credential {
        Credential::new(self.access, self.refresh).with_expiry(expiry_from(self.expires_in))
    }
}

/// Body of a successful refresh exchange. The refresh token is only present
/// when the backend rotates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

impl RefreshResponse {
    pub fn rotates(&self) -> bool {
        self.refresh.is_some()
    }

    /// Build the replacement credential, keeping `previous_refresh` unless
    /// the backend issued a new one.
    pub fn into_credential(self, previous_refresh: &str) -> Credential {
        let refresh = self.refresh.unwrap_or_else(|| previous_refresh.to_string());
        Credential::new(self.access, refresh).with_expiry(expiry_from(self.expires_in))
    }
}

fn expiry_from(expires_in: Option<i64>) -> Option<chrono::DateTime<Utc>> {
    expires_in.map(|secs| Utc::now() + Duration::seconds(secs))
}

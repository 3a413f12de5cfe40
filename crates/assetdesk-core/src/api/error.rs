use reqwest::StatusCode;
use thiserror::Error;

/// Every outcome an API call can fail with.
///
/// `Unauthenticated` and `SessionExpired` mean the user has to log in again.
/// Refresh failures never surface here: the executor turns them into
/// `SessionExpired`, and `RefreshCoordinator` callers get a `RefreshError`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not logged in")]
    Unauthenticated,

    #[error("Session expired - please log in again")]
    SessionExpired,

    #[error("{}", describe_failure(.status, .body))]
    RequestFailed {
        status: Option<StatusCode>,
        body: String,
    },

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Truncate a response body to avoid logging excessive data
pub(crate) fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
}

fn describe_failure(status: &Option<StatusCode>, body: &str) -> String {
    match status {
        Some(status) => format!("Request failed with status {}: {}", status, truncate_body(body)),
        None => format!("Network error: {}", truncate_body(body)),
    }
}

impl ApiError {
    /// True when the caller should send the user to log in.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ApiError::Unauthenticated | ApiError::SessionExpired)
    }

    /// HTTP status of a passed-through failure, if the server answered.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::RequestFailed { status, .. } => *status,
            _ => None,
        }
    }
}

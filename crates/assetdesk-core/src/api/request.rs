use reqwest::Method;
use serde::Serialize;

use super::ApiError;

/// What to call, built fresh for every request.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    pub body: Option<serde_json::Value>,
    pub requires_auth: bool,
    /// Whether a 401 may start a refresh and, failing that, end the session.
    pub renew_session: bool,
}

impl RequestDescriptor {
    /// An authenticated request with no body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            requires_auth: true,
            renew_session: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Sent without a bearer token and never refreshed (login, password reset).
    pub fn public(mut self) -> Self {
        self.requires_auth = false;
        self.renew_session = false;
        self
    }

    /// Carries the bearer token, but a 401 is handed back as a plain
    /// `RequestFailed` with the session left as it is (logout).
    pub fn no_refresh(mut self) -> Self {
        self.renew_session = false;
        self
    }
}

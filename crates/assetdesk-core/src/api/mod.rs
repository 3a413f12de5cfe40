//! REST API access for the asset management backend.
//!
//! This module provides the `ApiClient` with one method per endpoint, built on
//! the `AuthenticatedExecutor` which attaches the JWT bearer token, renews it
//! once through the refresh endpoint when the backend rejects it, and reports
//! a dead session through the `Navigator`.

pub mod client;
pub mod error;
pub mod executor;
pub mod redirect;
pub mod request;
pub mod transport;

pub use client::ApiClient;
pub use error::ApiError;
pub use executor::{AuthenticatedExecutor, Payload};
pub use redirect::{LoginRedirect, Navigator, NoopNavigator};
pub use request::RequestDescriptor;
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError};

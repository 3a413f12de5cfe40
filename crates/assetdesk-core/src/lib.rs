//! Client library for the asset management service.
//!
//! Handles the user session (token storage and single-flight refresh), an
//! authenticated executor that every request goes through, and typed access
//! to offices, divisions, assets, maintenance records and users.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod utils;

#[cfg(test)]
mod testing;

pub use api::{ApiClient, ApiError, Navigator, NoopNavigator, RequestDescriptor};
pub use auth::{Credential, FileTokenStore, KeyringTokenStore, MemoryTokenStore, TokenStore};
pub use config::Config;

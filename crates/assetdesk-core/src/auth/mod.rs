//! Session credentials and their renewal.
//!
//! This module provides:
//! - `TokenStore`: the access/refresh pair, with in-memory, file and
//!   OS keychain backends
//! - `RefreshCoordinator`: single-flight exchange of the refresh token for a
//!   new access token
//!
//! A store is always written as a whole pair and a failing backend reads as
//! "not logged in".

pub mod keychain;
pub mod refresh;
pub mod session;
pub mod store;

pub use keychain::KeyringTokenStore;
pub use refresh::{RefreshCoordinator, RefreshError, DEFAULT_REFRESH_PATH};
pub use session::FileTokenStore;
pub use store::{Credential, MemoryTokenStore, TokenStore};

//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! the backend URL, the refresh endpoint, request timeout, where the session
//! is kept, and the last used username.
//!
//! Configuration is stored at `~/.config/assetdesk/config.json`;
//! `ASSETDESK_API_URL` and `ASSETDESK_REFRESH_PATH` override the file.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::transport::DEFAULT_TIMEOUT_SECS;
use crate::auth::{
    FileTokenStore, KeyringTokenStore, MemoryTokenStore, TokenStore, DEFAULT_REFRESH_PATH,
};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "assetdesk";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const DEFAULT_API_URL: &str = "http://localhost:8000/api";

pub const ENV_API_URL: &str = "ASSETDESK_API_URL";
pub const ENV_REFRESH_PATH: &str = "ASSETDESK_REFRESH_PATH";

/// Where the session tokens live between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStorage {
    /// `session.json` in the cache directory
    #[default]
    File,
    /// OS keychain
    Keyring,
    /// Not persisted; gone when the process exits
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    pub refresh_path: String,
    pub request_timeout_secs: u64,
    pub session_storage: SessionStorage,
    pub last_username: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            session_storage: SessionStorage::default(),
            last_username: None,
        }
    }
}

impl Config {
    /// Load from disk (or defaults) and apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file {}", path.display()))
    }

    /// Apply overrides from `lookup` (the process environment in practice).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api_url = url.trim().to_string();
        }
        if let Some(path) = lookup(ENV_REFRESH_PATH).filter(|v| !v.trim().is_empty()) {
            self.refresh_path = path.trim().to_string();
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Build the configured token store.
    pub fn token_store(&self) -> Result<Arc<dyn TokenStore>> {
        Ok(match self.session_storage {
            SessionStorage::File => Arc::new(FileTokenStore::new(self.cache_dir()?)),
            SessionStorage::Keyring => Arc::new(KeyringTokenStore::for_account(&self.api_url)),
            SessionStorage::Memory => Arc::new(MemoryTokenStore::new()),
        })
    }
}

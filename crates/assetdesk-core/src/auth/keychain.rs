use anyhow::{Context, Result};
use keyring::Entry;
use tracing::warn;

use super::store::{Credential, TokenStore};

const SERVICE_NAME: &str = "assetdesk";

/// Single keychain entry that holds the serialized credential pair.
const ENTRY_NAME: &str = "session";

/// Credential store backed by the OS keychain.
///
/// The pair is kept in one entry so a save or clear is a single keychain
/// operation.
pub struct KeyringTokenStore {
    account: String,
}

impl KeyringTokenStore {
    pub fn new() -> Self {
        Self::for_account(ENTRY_NAME)
    }

    /// Separate keychain slot, e.g. one per backend URL.
    pub fn for_account(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
        }
    }

    fn entry(&self) -> Result<Entry> {
        Entry::new(SERVICE_NAME, &self.account).context("Failed to create keyring entry")
    }

    fn load(&self) -> Result<Option<Credential>> {
        let entry = self.entry()?;
        match entry.get_password() {
            Ok(secret) => {
                let credential =
                    serde_json::from_str(&secret).context("Failed to parse keychain session")?;
                Ok(Some(credential))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve session from keychain"),
        }
    }

    fn store(&self, credential: &Credential) -> Result<()> {
        let secret = serde_json::to_string(credential)?;
        self.entry()?
            .set_password(&secret)
            .context("Failed to store session in keychain")
    }
}

impl Default for KeyringTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for KeyringTokenStore {
    fn save(&self, credential: Credential) {
        if let Err(e) = self.store(&credential) {
            warn!(error = %e, "Keychain unavailable, session not saved");
        }
    }

    fn credential(&self) -> Option<Credential> {
        self.load().unwrap_or_else(|e| {
            warn!(error = %e, "Keychain unavailable, treating session as absent");
            None
        })
    }

    fn clear(&self) {
        let result = self.entry().and_then(|entry| match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete session from keychain"),
        });
        if let Err(e) = result {
            warn!(error = %e, "Failed to clear keychain session");
        }
    }
}

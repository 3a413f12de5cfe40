use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use super::store::{Credential, TokenStore};

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

/// Credential store persisted as a JSON file in the cache directory.
///
/// Every read goes to disk, so a second process (or a second store instance
/// over the same directory) sees a save immediately.
pub struct FileTokenStore {
    cache_dir: PathBuf,
}

impl FileTokenStore {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    pub fn path(&self) -> PathBuf {
        self.cache_dir.join(SESSION_FILE)
    }

    fn load(path: &Path) -> Result<Option<Credential>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path).context("Failed to read session file")?;
        let credential: Credential =
            serde_json::from_str(&contents).context("Failed to parse session file")?;
        Ok(Some(credential))
    }

    fn write(&self, credential: &Credential) -> Result<()> {
        std::fs::create_dir_all(&self.cache_dir).context("Failed to create cache directory")?;
        let contents = serde_json::to_string_pretty(credential)?;
        // Whole-file rename so a reader never sees half a pair
        let tmp = self.cache_dir.join(format!("{}.tmp", SESSION_FILE));
        std::fs::write(&tmp, contents).context("Failed to write session file")?;
        std::fs::rename(&tmp, self.path()).context("Failed to replace session file")?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn save(&self, credential: Credential) {
        if let Err(e) = self.write(&credential) {
            warn!(error = %e, "Failed to save session");
        } else {
            debug!(path = %self.path().display(), "Session saved");
        }
    }

    fn credential(&self) -> Option<Credential> {
        match Self::load(&self.path()) {
            Ok(credential) => credential,
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable session file");
                None
            }
        }
    }

    fn clear(&self) {
        let path = self.path();
        if path.exists() {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!(error = %e, "Failed to remove session file");
            }
        }
    }
}

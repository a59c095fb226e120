//! Durable backing stores for the session credential.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use keyring::Entry;
use tracing::debug;

use super::store::SessionCredential;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Session file name in the data directory
const SESSION_FILE: &str = "session.json";

/// Keychain service name
const KEYRING_SERVICE: &str = "leadranker";

/// Keychain account the session record is stored under
const KEYRING_ACCOUNT: &str = "session";

/// Somewhere the session credential survives a restart.
///
/// Implementations are called from the `TokenStore` only: `load` once on
/// first access, `save` on every `set`, `clear` on every `clear`.
pub trait TokenBackend: Send + Sync {
    fn load(&self) -> Result<Option<SessionCredential>>;
    fn save(&self, credential: &SessionCredential) -> Result<()>;
    /// Remove the stored credential. Must succeed when nothing is stored.
    fn clear(&self) -> Result<()>;
}

/// JSON file in the user data directory, readable only by the owner.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(SESSION_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenBackend for FileBackend {
    fn load(&self) -> Result<Option<SessionCredential>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents =
            std::fs::read_to_string(&self.path).context("Failed to read session file")?;
        let credential: SessionCredential =
            serde_json::from_str(&contents).context("Failed to parse session file")?;
        debug!(path = %self.path.display(), "Session loaded from file");
        Ok(Some(credential))
    }

    fn save(&self, credential: &SessionCredential) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create data directory")?;
        }
        let contents = serde_json::to_string_pretty(credential)?;
        std::fs::write(&self.path, contents).context("Failed to write session file")?;

        #[cfg(unix)]
        {
            let mut perms = std::fs::metadata(&self.path)?.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(&self.path, perms)?;
        }

        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path).context("Failed to remove session file")?;
        }
        Ok(())
    }
}

/// OS keychain entry holding the serialized session record.
pub struct KeyringBackend {
    account: String,
}

impl KeyringBackend {
    pub fn new() -> Self {
        Self {
            account: KEYRING_ACCOUNT.to_string(),
        }
    }

    fn entry(&self) -> Result<Entry> {
        Entry::new(KEYRING_SERVICE, &self.account).context("Failed to create keyring entry")
    }
}

impl Default for KeyringBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenBackend for KeyringBackend {
    fn load(&self) -> Result<Option<SessionCredential>> {
        match self.entry()?.get_password() {
            Ok(secret) => {
                let credential: SessionCredential = serde_json::from_str(&secret)
                    .context("Failed to parse session stored in keychain")?;
                Ok(Some(credential))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to read session from keychain"),
        }
    }

    fn save(&self, credential: &SessionCredential) -> Result<()> {
        let secret = serde_json::to_string(credential)?;
        self.entry()?
            .set_password(&secret)
            .context("Failed to store session in keychain")
    }

    fn clear(&self) -> Result<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete session from keychain"),
        }
    }
}

/// Process-local backend. Clones share the same slot, so two stores built
/// over clones of one `MemoryBackend` behave like a restart over a disk file.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    slot: Arc<Mutex<Option<SessionCredential>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: SessionCredential) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(credential))),
        }
    }

    /// Peek at what is "on disk".
    pub fn stored(&self) -> Option<SessionCredential> {
        self.slot.lock().map(|slot| slot.clone()).unwrap_or(None)
    }
}

impl TokenBackend for MemoryBackend {
    fn load(&self) -> Result<Option<SessionCredential>> {
        let slot = self
            .slot
            .lock()
            .map_err(|_| anyhow::anyhow!("Memory backend lock poisoned"))?;
        Ok(slot.clone())
    }

    fn save(&self, credential: &SessionCredential) -> Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| anyhow::anyhow!("Memory backend lock poisoned"))?;
        *slot = Some(credential.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| anyhow::anyhow!("Memory backend lock poisoned"))?;
        *slot = None;
        Ok(())
    }
}

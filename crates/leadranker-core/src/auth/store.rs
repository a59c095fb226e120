use std::fmt;
use std::sync::{Mutex, OnceLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::backend::{MemoryBackend, TokenBackend};

/// The bearer token of the logged-in user, plus the email shown in the UI.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCredential {
    pub token: String,
    #[serde(rename = "user_email", default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl SessionCredential {
    pub fn new(token: impl Into<String>, email: Option<String>) -> Self {
        Self {
            token: token.into(),
            email,
        }
    }

    /// Email for display, or a placeholder.
    pub fn display_name(&self) -> &str {
        self.email.as_deref().unwrap_or("signed in")
    }
}

// Never print the token itself
impl fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredential")
            .field("token", &"<redacted>")
            .field("email", &self.email)
            .finish()
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Session credential must not be empty")]
    EmptyCredential,

    #[error("Failed to persist session: {0:#}")]
    Persist(anyhow::Error),

    #[error("Failed to remove stored session: {0:#}")]
    Remove(anyhow::Error),

    #[error("Token store lock poisoned")]
    Poisoned,
}

/// Single source of truth for the session credential.
///
/// Built once per application and shared as `Arc<TokenStore>` by the API
/// client, the session flows and the route guard. The durable backend is
/// read lazily on the first access of any kind; after that the in-memory
/// value is authoritative and every change is written through.
pub struct TokenStore {
    backend: Box<dyn TokenBackend>,
    loaded: OnceLock<()>,
    current: watch::Sender<Option<SessionCredential>>,
    writes: Mutex<()>,
}

impl TokenStore {
    pub fn new(backend: impl TokenBackend + 'static) -> Self {
        Self::with_boxed_backend(Box::new(backend))
    }

    pub fn with_boxed_backend(backend: Box<dyn TokenBackend>) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            backend,
            loaded: OnceLock::new(),
            current,
            writes: Mutex::new(()),
        }
    }

    /// A store that forgets everything when dropped.
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    /// Current credential, if any.
    pub fn get(&self) -> Option<SessionCredential> {
        self.ensure_loaded();
        self.current.borrow().clone()
    }

    /// Current bearer token, if any.
    pub fn token(&self) -> Option<String> {
        self.get().map(|c| c.token)
    }

    pub fn is_present(&self) -> bool {
        self.get().is_some()
    }

    /// Replace the credential, persist it and notify subscribers.
    ///
    /// The backend is written first; if that fails the in-memory value is
    /// left untouched so memory and disk never disagree.
    pub fn set(&self, credential: SessionCredential) -> Result<(), StoreError> {
        if credential.token.trim().is_empty() {
            return Err(StoreError::EmptyCredential);
        }

        let _guard = self.writes.lock().map_err(|_| StoreError::Poisoned)?;
        // A set before the first read wins over whatever is on disk
        self.loaded.get_or_init(|| ());

        self.backend.save(&credential).map_err(StoreError::Persist)?;
        info!(email = ?credential.email, "Session credential stored");
        self.current.send_replace(Some(credential));
        Ok(())
    }

    /// Drop the credential from memory and the backend.
    ///
    /// Clearing an empty store is a no-op and does not wake subscribers.
    pub fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.writes.lock().map_err(|_| StoreError::Poisoned)?;
        self.loaded.get_or_init(|| ());

        let had_credential = self.current.send_if_modified(|current| current.take().is_some());
        if had_credential {
            info!("Session credential cleared");
        }
        self.backend.clear().map_err(StoreError::Remove)
    }

    /// Clear only while `token` is still the stored credential. Returns
    /// whether anything was removed.
    pub fn clear_token(&self, token: &str) -> Result<bool, StoreError> {
        let _guard = self.writes.lock().map_err(|_| StoreError::Poisoned)?;
        self.ensure_loaded();

        let matched = self
            .current
            .send_if_modified(|current| match current {
                Some(credential) if credential.token == token => current.take().is_some(),
                _ => false,
            });
        if !matched {
            debug!("Stored credential changed, keeping it");
            return Ok(false);
        }
        info!("Session credential cleared");
        self.backend.clear().map_err(StoreError::Remove)?;
        Ok(true)
    }

    /// Watch login state. The receiver sees every `set` and every `clear`
    /// that actually removed a credential.
    pub fn subscribe(&self) -> watch::Receiver<Option<SessionCredential>> {
        self.ensure_loaded();
        self.current.subscribe()
    }

    fn ensure_loaded(&self) {
        self.loaded.get_or_init(|| match self.backend.load() {
            Ok(Some(credential)) if !credential.token.trim().is_empty() => {
                debug!("Restored session credential from backend");
                self.current.send_replace(Some(credential));
            }
            Ok(_) => debug!("No stored session credential"),
            Err(e) => warn!(error = %e, "Failed to load stored session, starting signed out"),
        });
    }
}

impl fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStore")
            .field("present", &self.current.borrow().is_some())
            .finish()
    }
}

//! Application configuration management.
//!
//! This module handles loading and saving the client configuration: which
//! backend to talk to, where the session credential is kept, and a couple of
//! display-only preferences (last email used, selected plan).
//!
//! Configuration is stored at `~/.config/leadranker/config.json`. The
//! backend address and token backend can be overridden from the environment
//! (`LEADRANKER_API_URL`, `LEADRANKER_TOKEN_BACKEND`), including a `.env` file
//! loaded by the binary.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::{FileBackend, KeyringBackend, TokenBackend, TokenStore};

/// Application name used for config/data directory paths
const APP_NAME: &str = "leadranker";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Backend used when nothing is configured
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";

/// HTTP request timeout in seconds.
/// The client adds no timeout policy of its own; this only bounds a hung socket.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

pub const ENV_API_URL: &str = "LEADRANKER_API_URL";
pub const ENV_TOKEN_BACKEND: &str = "LEADRANKER_TOKEN_BACKEND";

/// Where the session credential is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TokenBackendKind {
    /// `session.json` in the data directory
    #[default]
    File,
    /// OS keychain
    Keyring,
}

impl TokenBackendKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Some(Self::File),
            "keyring" | "keychain" => Some(Self::Keyring),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub token_backend: TokenBackendKind,
    pub request_timeout_secs: u64,
    pub last_email: Option<String>,
    pub selected_plan: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            token_backend: TokenBackendKind::File,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            last_email: None,
            selected_plan: None,
        }
    }
}

impl Config {
    /// Load the config file (or defaults) and apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        debug!(api_base_url = %config.api_base_url, backend = ?config.token_backend, "Config loaded");
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply overrides from a key lookup (the process environment in practice).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL).filter(|u| !u.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
        if let Some(kind) = lookup(ENV_TOKEN_BACKEND).as_deref().and_then(TokenBackendKind::parse) {
            self.token_backend = kind;
        }
    }

    /// Base URL without a trailing slash, so paths can be appended verbatim.
    pub fn base_url(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for the session file and logs.
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Build the configured durable backend.
    pub fn token_backend(&self) -> Result<Box<dyn TokenBackend>> {
        Ok(match self.token_backend {
            TokenBackendKind::File => Box::new(FileBackend::new(self.data_dir()?)),
            TokenBackendKind::Keyring => Box::new(KeyringBackend::new()),
        })
    }

    /// The application's one token store.
    pub fn token_store(&self) -> Result<TokenStore> {
        Ok(TokenStore::with_boxed_backend(self.token_backend()?))
    }
}

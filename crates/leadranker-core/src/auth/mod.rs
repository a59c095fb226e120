//! Authentication state for the client.
//!
//! This module provides:
//! - `TokenStore`: the single source of truth for the session credential,
//!   loaded lazily from a durable backend and observable through `subscribe`
//! - `TokenBackend`: durable storage for the credential (file, OS keychain,
//!   or memory)

pub mod backend;
pub mod store;

pub use backend::{FileBackend, KeyringBackend, MemoryBackend, TokenBackend};
pub use store::{SessionCredential, StoreError, TokenStore};

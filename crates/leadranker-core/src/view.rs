//! Lifetime helpers for screens that load data in the background.
//!
//! A screen owns a `Mount`. Each load captures a `MountTicket`; when the
//! result comes back the screen checks `is_live()` and drops it if the user
//! has navigated away since. Loaded data lives in a `Slot`, which always
//! keeps the most recently applied result.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::api::ApiError;

/// Mount generation for one screen.
#[derive(Debug, Default)]
pub struct Mount {
    generation: Arc<AtomicU64>,
    mounted: bool,
}

impl Mount {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the screen as shown. Tickets from earlier mounts stay dead.
    pub fn mount(&mut self) {
        if !self.mounted {
            self.generation.fetch_add(1, Ordering::SeqCst);
            self.mounted = true;
        }
    }

    /// Mark the screen as gone; every outstanding ticket becomes stale.
    pub fn unmount(&mut self) {
        if self.mounted {
            self.generation.fetch_add(1, Ordering::SeqCst);
            self.mounted = false;
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn ticket(&self) -> MountTicket {
        MountTicket {
            generation: Arc::clone(&self.generation),
            issued_at: self.generation.load(Ordering::SeqCst),
        }
    }
}

/// Ties a response to the mount that asked for it.
#[derive(Debug, Clone)]
pub struct MountTicket {
    generation: Arc<AtomicU64>,
    issued_at: u64,
}

impl MountTicket {
    /// True while the issuing screen is still mounted.
    pub fn is_live(&self) -> bool {
        self.generation.load(Ordering::SeqCst) == self.issued_at
    }
}

/// State of one piece of screen data.
#[derive(Debug, Clone, Default)]
pub enum Slot<T> {
    #[default]
    Idle,
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> Slot<T> {
    pub fn start(&mut self) {
        *self = Slot::Loading;
    }

    /// Overwrite with a result; the last one applied wins.
    pub fn apply(&mut self, result: Result<T, ApiError>) {
        *self = match result {
            Ok(value) => Slot::Ready(value),
            Err(e) => Slot::Failed(e.message()),
        };
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Slot::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Slot::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Slot::Loading)
    }

    pub fn reset(&mut self) {
        *self = Slot::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_ticket_dies_on_unmount() {
        let mut mount = Mount::new();
        mount.mount();
        let ticket = mount.ticket();
        assert!(ticket.is_live());

        mount.unmount();
        assert!(!ticket.is_live());
    }

    #[test]
    fn test_remount_does_not_revive_old_tickets() {
        let mut mount = Mount::new();
        mount.mount();
        let first = mount.ticket();
        mount.unmount();
        mount.mount();
        let second = mount.ticket();

        assert!(!first.is_live());
        assert!(second.is_live());
    }

    #[test]
    fn test_repeated_mount_keeps_tickets() {
        let mut mount = Mount::new();
        mount.mount();
        let ticket = mount.ticket();
        mount.mount();
        assert!(ticket.is_live());
    }

    #[test]
    fn test_slot_last_result_wins() {
        let mut slot: Slot<u32> = Slot::default();
        slot.start();
        assert!(slot.is_loading());

        slot.apply(Ok(1));
        slot.apply(Err(ApiError::from_status(
            StatusCode::BAD_REQUEST,
            r#"{"detail": "nope"}"#,
        )));
        assert_eq!(slot.error(), Some("nope"));

        slot.apply(Ok(3));
        assert_eq!(slot.ready(), Some(&3));
    }
}

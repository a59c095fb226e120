//! REST API client module for the LeadRanker backend.
//!
//! This module provides the `ApiClient` used by every screen to talk to the
//! backend, and the `ApiError` every failed call is normalized into.
//!
//! The backend uses bearer token authentication. The client reads the token
//! from the shared `TokenStore` on each call and never changes it; reacting
//! to an authentication failure is the job of `Session::protected`.

pub mod client;
pub mod endpoints;
pub mod error;

pub use client::ApiClient;
pub use endpoints::HISTORY_PAGE_SIZE;
pub use error::ApiError;

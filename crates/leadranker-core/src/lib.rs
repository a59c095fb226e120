//! Core library for the LeadRanker client.
//!
//! Everything that talks to the LeadRanker backend or decides what the user
//! may see lives here, independent of how it is rendered:
//!
//! - `auth`: the session `TokenStore` and its durable backends
//! - `api`: the authenticated `ApiClient` and the uniform `ApiError`
//! - `session`: login/register/OAuth/logout flows and the `protected` wrapper
//! - `router`: routes, navigation history and the `RouteGuard`
//! - `view`: mount liveness tickets and last-received-wins data slots
//! - `models`: typed request and response schemas
//! - `config`: user configuration and data directories

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod router;
pub mod session;
pub mod utils;
pub mod view;

pub use api::{ApiClient, ApiError};
pub use auth::{SessionCredential, StoreError, TokenStore};
pub use config::Config;
pub use router::{Navigator, Route, RouteGuard};
pub use session::{Registration, Session, SessionError};
pub use view::{Mount, MountTicket, Slot};

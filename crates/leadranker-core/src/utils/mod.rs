//! Utility functions for display formatting and URL handling.

pub mod format;
pub mod url;

pub use format::{format_count, format_phone, format_score, format_timestamp, truncate};
pub use url::{path_of, query_param};

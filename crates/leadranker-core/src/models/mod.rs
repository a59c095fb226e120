//! Request and response schemas for the LeadRanker backend.
//!
//! Responses are decoded into these types at the API client boundary, so a
//! missing or mistyped field becomes an `ApiError::Decode` instead of a blank
//! cell somewhere in a screen.
//!
//! - `account`: login, registration, OAuth and password-reset payloads
//! - `lead`: leads, history pages, statistics and scoring
//! - `billing`: usage, plans, checkout and referrals
//! - `settings`: inbound connections and account settings

pub mod account;
pub mod billing;
pub mod lead;
pub mod settings;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use account::{
    Account, ForgotPasswordRequest, LoginRequest, MessageResponse, OAuthStart, RegisterRequest,
    RegisterResponse, ResetPasswordRequest, TokenResponse, DEFAULT_INDUSTRY,
};
pub use billing::{
    AlertLevel, CheckoutRequest, CheckoutSession, PlanCatalog, PlanInfo, Referral, ReferralStats,
    ReferralStatus, ReferralSubmit, Referrals, Usage, UsageAlert, VerifiedSession, UPGRADE_PLANS,
};
pub use lead::{
    HistoryFilter, Lead, LeadBucket, LeadHistory, LeadStats, LeadSummary, ScoreRequest,
    ScoreResult, DEFAULT_SOURCE, IGNORED_SCORE_THRESHOLD,
};
pub use settings::{Connections, SettingsUpdate};

/// Backend identifiers come back as integers or UUID strings depending on
/// the table; keep whichever we get.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(id) => write!(f, "{}", id),
            RecordId::Text(id) => f.write_str(id),
        }
    }
}

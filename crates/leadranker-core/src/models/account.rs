use serde::{Deserialize, Serialize};

use super::RecordId;

/// Industry sent on registration when the user picks none
pub const DEFAULT_INDUSTRY: &str = "real_estate";

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    /// Organization name; the backend calls organizations brokerages.
    #[serde(rename = "brokerage_name")]
    pub organization: String,
    pub industry: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Registration either signs the user in directly or asks them to verify
/// their email first.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl RegisterResponse {
    pub fn token(&self) -> Option<&str> {
        self.access_token.as_deref().filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OAuthStart {
    pub auth_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl MessageResponse {
    pub fn message_or(&self, fallback: &str) -> String {
        self.message.clone().unwrap_or_else(|| fallback.to_string())
    }
}

/// The signed-in user as the backend sees them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Account {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub brokerage_id: Option<RecordId>,
    #[serde(default)]
    pub sub: Option<String>,
}

impl Account {
    /// The backend puts the email in `sub` on token-derived identities.
    pub fn display_email(&self) -> Option<&str> {
        self.email.as_deref().or(self.sub.as_deref())
    }
}

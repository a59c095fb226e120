use serde::{Deserialize, Serialize};

/// Where leads reach the backend from outside.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Connections {
    pub email_forwarding: String,
    pub webhook_url: String,
    #[serde(default)]
    pub status: Option<String>,
}

impl Connections {
    pub fn is_connected(&self) -> bool {
        self.status.as_deref() == Some("connected")
    }
}

/// Partial settings update; unset fields are left alone by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SettingsUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_forwarding: Option<String>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        self.industry.is_none() && self.email_forwarding.is_none()
    }
}

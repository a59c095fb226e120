use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::RecordId;

/// Plans a user can upgrade to
pub const UPGRADE_PLANS: [&str; 2] = ["starter", "team"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Error,
    Warning,
    Info,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageAlert {
    #[serde(rename = "type")]
    pub level: AlertLevel,
    pub message: String,
}

/// Monthly usage against the plan limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub plan: String,
    #[serde(default)]
    pub subscription_status: Option<String>,
    pub usage: u64,
    pub limit: u64,
    #[serde(default)]
    pub remaining: u64,
    #[serde(default)]
    pub percent: u32,
    #[serde(default)]
    pub blocked: bool,
    #[serde(default)]
    pub alerts: Vec<UsageAlert>,
}

impl Usage {
    pub fn plan_label(&self) -> &str {
        match self.plan.as_str() {
            "trial" => "Free Trial",
            "free" => "Free",
            "starter" => "Starter",
            "team" => "Team",
            other => other,
        }
    }

    pub fn plan_tagline(&self) -> &'static str {
        match self.plan.as_str() {
            "starter" => "$19/mo · 1,000 leads/mo",
            "team" => "$49/mo · 5,000 leads/mo",
            _ => "50 leads/mo · No credit card needed",
        }
    }

    pub fn is_paid(&self) -> bool {
        !matches!(self.plan.as_str(), "trial" | "free")
    }

    pub fn status_label(&self) -> &'static str {
        match self.subscription_status.as_deref() {
            Some("active") => "✓ Active",
            Some("past_due") => "⚠ Past Due",
            Some("canceled") => "✗ Canceled",
            _ => "Free Trial",
        }
    }

    /// Usage ratio for gauges, clamped to 0.0..=1.0
    pub fn ratio(&self) -> f64 {
        if self.limit == 0 {
            return 0.0;
        }
        (self.usage as f64 / self.limit as f64).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanInfo {
    pub limit: u64,
    pub amount: String,
}

/// `/api/v1/billing/plans`: plan name -> terms
pub type PlanCatalog = BTreeMap<String, PlanInfo>;

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutRequest {
    pub plan: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub checkout_url: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifiedSession {
    pub status: String,
    #[serde(default)]
    pub plan: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferralStatus {
    Pending,
    Qualified,
    Rewarded,
    Expired,
    #[serde(other)]
    Unknown,
}

impl ReferralStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ReferralStatus::Pending => "pending",
            ReferralStatus::Qualified => "qualified",
            ReferralStatus::Rewarded => "rewarded",
            ReferralStatus::Expired => "expired",
            ReferralStatus::Unknown => "-",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Referral {
    #[serde(default)]
    pub id: Option<RecordId>,
    pub referee_email: String,
    pub status: ReferralStatus,
    #[serde(default)]
    pub submitted_at: Option<String>,
    #[serde(default)]
    pub qualified_at: Option<String>,
    #[serde(default)]
    pub rewarded_at: Option<String>,
    #[serde(default)]
    pub days_since_qualified: Option<i64>,
    #[serde(default)]
    pub days_remaining: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReferralStats {
    pub total: u32,
    pub pending: u32,
    pub qualified: u32,
    pub rewarded: u32,
    pub total_earned_usd: f64,
    pub credit_per_referral: f64,
    pub qualify_days: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Referrals {
    #[serde(default)]
    pub referrals: Vec<Referral>,
    #[serde(default)]
    pub stats: Option<ReferralStats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReferralSubmit {
    pub referee_email: String,
}

//! Typed wrappers for each backend endpoint.
//!
//! Everything here goes through `ApiClient::request`, so headers, decoding
//! and error mapping behave the same for every route.

use tracing::instrument;

use crate::models::{
    Account, CheckoutRequest, CheckoutSession, Connections, ForgotPasswordRequest, LeadHistory,
    LeadStats, LoginRequest, MessageResponse, OAuthStart, PlanCatalog, Referrals, ReferralSubmit,
    RegisterRequest, RegisterResponse, ResetPasswordRequest, ScoreRequest, ScoreResult,
    SettingsUpdate, TokenResponse, Usage, VerifiedSession, UPGRADE_PLANS,
};

use super::{ApiClient, ApiError};

// ============================================================================
// Paths
// ============================================================================

const LOGIN: &str = "/auth/login";
const REGISTER: &str = "/auth/register";
const GOOGLE_LOGIN: &str = "/auth/google/login";
const FORGOT_PASSWORD: &str = "/auth/forgot-password";
const RESET_PASSWORD: &str = "/auth/reset-password";
const ME: &str = "/api/v1/auth/me";

const LEAD_STATS: &str = "/leads/stats";
const LEAD_HISTORY: &str = "/leads/history";
const LEAD_SCORE: &str = "/leads/score";

const BILLING_USAGE: &str = "/api/v1/billing/usage";
const BILLING_PLANS: &str = "/api/v1/billing/plans";
const BILLING_CHECKOUT: &str = "/api/v1/billing/checkout";
const BILLING_VERIFY: &str = "/api/v1/billing/verify-session";
const REFERRALS: &str = "/api/v1/billing/referrals";
const REFERRAL_SUBMIT: &str = "/api/v1/billing/referrals/submit";

const CONNECTIONS: &str = "/settings/connections";
const SETTINGS: &str = "/settings";

/// Rows per page on the history screen
pub const HISTORY_PAGE_SIZE: u32 = 20;

impl ApiClient {
    // ========================================================================
    // Authentication
    // ========================================================================

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: &LoginRequest) -> Result<TokenResponse, ApiError> {
        self.post(LOGIN, request).await
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse, ApiError> {
        self.post(REGISTER, request).await
    }

    pub async fn oauth_start(&self) -> Result<OAuthStart, ApiError> {
        self.get(GOOGLE_LOGIN).await
    }

    pub async fn forgot_password(&self, email: &str) -> Result<MessageResponse, ApiError> {
        let body = ForgotPasswordRequest {
            email: email.to_string(),
        };
        self.post(FORGOT_PASSWORD, &body).await
    }

    pub async fn reset_password(
        &self,
        request: &ResetPasswordRequest,
    ) -> Result<MessageResponse, ApiError> {
        self.post(RESET_PASSWORD, request).await
    }

    pub async fn me(&self) -> Result<Account, ApiError> {
        self.get(ME).await
    }

    // ========================================================================
    // Leads
    // ========================================================================

    pub async fn lead_stats(&self) -> Result<LeadStats, ApiError> {
        self.get(LEAD_STATS).await
    }

    /// One page of scored leads, newest first.
    pub async fn lead_history(&self, limit: u32, offset: u32) -> Result<LeadHistory, ApiError> {
        let query = [("limit", limit.to_string()), ("offset", offset.to_string())];
        self.get_with_query(LEAD_HISTORY, &query).await
    }

    #[instrument(skip(self, request), fields(source = %request.source))]
    pub async fn score_lead(&self, request: &ScoreRequest) -> Result<ScoreResult, ApiError> {
        if request.message.trim().is_empty() {
            return Err(ApiError::InvalidRequest(
                "Lead message must not be empty".to_string(),
            ));
        }
        self.post(LEAD_SCORE, request).await
    }

    // ========================================================================
    // Billing
    // ========================================================================

    pub async fn billing_usage(&self) -> Result<Usage, ApiError> {
        self.get(BILLING_USAGE).await
    }

    pub async fn billing_plans(&self) -> Result<PlanCatalog, ApiError> {
        self.get(BILLING_PLANS).await
    }

    /// Start a hosted checkout for `plan` ("starter" or "team").
    #[instrument(skip(self))]
    pub async fn create_checkout(&self, plan: &str) -> Result<CheckoutSession, ApiError> {
        let plan = plan.trim().to_lowercase();
        if !UPGRADE_PLANS.contains(&plan.as_str()) {
            return Err(ApiError::InvalidRequest(format!("Unknown plan: {}", plan)));
        }
        self.post(BILLING_CHECKOUT, &CheckoutRequest { plan }).await
    }

    pub async fn verify_checkout(&self, session_id: &str) -> Result<VerifiedSession, ApiError> {
        let session_id = session_id.trim();
        if session_id.is_empty() {
            return Err(ApiError::InvalidRequest(
                "Checkout session id must not be empty".to_string(),
            ));
        }
        self.get_with_query(BILLING_VERIFY, &[("session_id", session_id.to_string())])
            .await
    }

    pub async fn referrals(&self) -> Result<Referrals, ApiError> {
        self.get(REFERRALS).await
    }

    pub async fn submit_referral(&self, referee_email: &str) -> Result<MessageResponse, ApiError> {
        let body = ReferralSubmit {
            referee_email: referee_email.trim().to_string(),
        };
        self.post(REFERRAL_SUBMIT, &body).await
    }

    // ========================================================================
    // Settings
    // ========================================================================

    pub async fn connections(&self) -> Result<Connections, ApiError> {
        self.get(CONNECTIONS).await
    }

    pub async fn update_settings(&self, update: &SettingsUpdate) -> Result<MessageResponse, ApiError> {
        if update.is_empty() {
            return Err(ApiError::InvalidRequest("Nothing to update".to_string()));
        }
        self.put(SETTINGS, update).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use mockito::{Matcher, Server};
    use serde_json::json;

    use super::*;
    use crate::auth::{SessionCredential, TokenStore};
    use crate::models::{AlertLevel, LeadBucket};

    fn signed_in(server: &Server) -> ApiClient {
        let store = TokenStore::in_memory();
        store
            .set(SessionCredential::new("tok", Some("agent@example.com".into())))
            .expect("set");
        ApiClient::new(server.url(), Arc::new(store)).expect("client")
    }

    #[tokio::test]
    async fn test_history_sends_paging_query() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/leads/history")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("limit".into(), "20".into()),
                Matcher::UrlEncoded("offset".into(), "40".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"data": [
                    {"id": 3, "name": "Ana", "score": 91, "bucket": "HOT", "source": "Zillow"},
                    {"id": 2, "name": "Bo", "score": 8, "bucket": "IGNORE"}
                ]}"#,
            )
            .create_async()
            .await;

        let history = signed_in(&server)
            .lead_history(HISTORY_PAGE_SIZE, 40)
            .await
            .expect("history");
        assert_eq!(history.leads.len(), 2);
        assert_eq!(history.leads[1].bucket, Some(LeadBucket::Ignore));
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_score_quota_exceeded_surfaces_detail() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/leads/score")
            .match_body(Matcher::PartialJson(json!({"message": "Need a condo", "source": "manual"})))
            .with_status(402)
            .with_body(r#"{"detail": "Quota exceeded"}"#)
            .create_async()
            .await;

        let err = signed_in(&server)
            .score_lead(&ScoreRequest::new("Need a condo"))
            .await
            .expect_err("402");
        assert_eq!(err.message(), "Quota exceeded");
        assert_eq!(err.status(), Some(402));
        assert!(!err.is_auth_failure());
    }

    #[tokio::test]
    async fn test_score_result_with_billing() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/leads/score")
            .with_status(200)
            .with_body(
                r#"{"score": 84, "bucket": "HOT", "sentiment": "positive",
                    "recommendation": "Call within the hour",
                    "billing": {"plan": "trial", "usage": 3, "limit": 50, "remaining": 47, "percent": 6, "blocked": false}}"#,
            )
            .create_async()
            .await;

        let result = signed_in(&server)
            .score_lead(&ScoreRequest::new("Pre-approved, ready this week"))
            .await
            .expect("score");
        assert_eq!(result.bucket, LeadBucket::Hot);
        assert_eq!(result.billing.map(|b| b.remaining), Some(47));
    }

    #[tokio::test]
    async fn test_blank_lead_message_not_sent() {
        let server = Server::new_async().await;
        let err = signed_in(&server)
            .score_lead(&ScoreRequest::new("   "))
            .await
            .expect_err("invalid");
        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_usage_with_alerts() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/v1/billing/usage")
            .with_status(200)
            .with_body(
                r#"{"plan": "starter", "subscription_status": "active", "usage": 1000, "limit": 1000,
                    "remaining": 0, "percent": 100, "blocked": true,
                    "alerts": [{"type": "error", "message": "Lead limit reached"}]}"#,
            )
            .create_async()
            .await;

        let usage = signed_in(&server).billing_usage().await.expect("usage");
        assert!(usage.blocked);
        assert_eq!(usage.alerts[0].level, AlertLevel::Error);
        assert_eq!(usage.status_label(), "✓ Active");
    }

    #[tokio::test]
    async fn test_checkout_normalizes_plan() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/api/v1/billing/checkout")
            .match_body(Matcher::Json(json!({"plan": "team"})))
            .with_status(200)
            .with_body(r#"{"checkout_url": "https://checkout.stripe.com/c/pay/cs_1", "session_id": "cs_1"}"#)
            .create_async()
            .await;

        let session = signed_in(&server).create_checkout(" Team ").await.expect("checkout");
        assert_eq!(session.session_id.as_deref(), Some("cs_1"));
        m.assert_async().await;

        let err = signed_in(&server)
            .create_checkout("enterprise")
            .await
            .expect_err("unknown plan");
        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_verify_checkout_encodes_session_id() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/api/v1/billing/verify-session")
            .match_query(Matcher::UrlEncoded("session_id".into(), "cs_test a&b".into()))
            .with_status(200)
            .with_body(r#"{"status": "complete", "plan": "starter"}"#)
            .create_async()
            .await;

        let verified = signed_in(&server)
            .verify_checkout("cs_test a&b")
            .await
            .expect("verify");
        assert_eq!(verified.plan.as_deref(), Some("starter"));
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_settings_uses_put() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("PUT", "/settings")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({"industry": "insurance"})))
            .with_status(200)
            .with_body(r#"{"message": "Settings saved"}"#)
            .create_async()
            .await;

        let client = signed_in(&server);
        let update = SettingsUpdate {
            industry: Some("insurance".into()),
            ..Default::default()
        };
        let resp = client.update_settings(&update).await.expect("saved");
        assert_eq!(resp.message_or("Saved"), "Settings saved");
        m.assert_async().await;

        let err = client
            .update_settings(&SettingsUpdate::default())
            .await
            .expect_err("empty");
        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_submit_referral() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/api/v1/billing/referrals/submit")
            .match_body(Matcher::Json(json!({"referee_email": "friend@example.com"})))
            .with_status(200)
            .with_body(r#"{"status": "success", "message": "Referral submitted"}"#)
            .create_async()
            .await;

        let resp = signed_in(&server)
            .submit_referral(" friend@example.com ")
            .await
            .expect("submitted");
        assert_eq!(resp.message.as_deref(), Some("Referral submitted"));
        m.assert_async().await;
    }
}

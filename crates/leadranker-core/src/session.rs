//! Sign-in, sign-out and the authentication-failure policy.
//!
//! `Session` is the only code that writes the `TokenStore` besides logout:
//! successful login, registration-with-token and the OAuth callback store a
//! credential, and `protected` clears it when the backend rejects one.

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::auth::{SessionCredential, StoreError, TokenStore};
use crate::models::{Account, LoginRequest, RegisterRequest, ResetPasswordRequest, DEFAULT_INDUSTRY};
use crate::utils::query_param;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Input rejected before anything was sent.
    #[error("{0}")]
    Invalid(&'static str),
}

impl SessionError {
    /// Message to show next to the form.
    pub fn message(&self) -> String {
        match self {
            SessionError::Api(e) => e.message(),
            other => other.to_string(),
        }
    }
}

/// What a registration ended in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// The backend issued a token right away.
    SignedIn(SessionCredential),
    /// The account must be verified by email before signing in.
    VerificationSent(String),
}

const VERIFICATION_SENT: &str = "Verification email sent. Please check your inbox.";
const RESET_LINK_SENT: &str = "If that email exists, a reset link was sent.";
const PASSWORD_UPDATED: &str = "Password updated. You can sign in now.";

#[derive(Clone)]
pub struct Session {
    api: ApiClient,
}

impl Session {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn store(&self) -> &Arc<TokenStore> {
        self.api.store()
    }

    pub fn current(&self) -> Option<SessionCredential> {
        self.store().get()
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<SessionCredential, SessionError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(SessionError::Invalid("Email and password are required"));
        }

        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self.api.login(&request).await?;

        let credential = SessionCredential::new(
            response.access_token,
            Some(response.email.unwrap_or_else(|| email.to_string())),
        );
        self.store().set(credential.clone())?;
        info!(email, "Signed in");
        Ok(credential)
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        organization: &str,
        industry: Option<&str>,
    ) -> Result<Registration, SessionError> {
        let email = email.trim();
        let organization = organization.trim();
        if email.is_empty() || password.is_empty() || organization.is_empty() {
            return Err(SessionError::Invalid("All fields are required"));
        }

        let request = RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            organization: organization.to_string(),
            industry: industry
                .map(str::trim)
                .filter(|i| !i.is_empty())
                .unwrap_or(DEFAULT_INDUSTRY)
                .to_string(),
        };
        let response = self.api.register(&request).await?;

        match response.token() {
            Some(token) => {
                let credential = SessionCredential::new(token, Some(email.to_string()));
                self.store().set(credential.clone())?;
                info!(email, "Registered and signed in");
                Ok(Registration::SignedIn(credential))
            }
            None => {
                info!(email, "Registered, awaiting email verification");
                Ok(Registration::VerificationSent(
                    response.message.unwrap_or_else(|| VERIFICATION_SENT.to_string()),
                ))
            }
        }
    }

    /// URL of the Google consent screen.
    pub async fn oauth_start(&self) -> Result<String, SessionError> {
        let start = self.api.oauth_start().await?;
        if start.auth_url.trim().is_empty() {
            return Err(SessionError::Invalid("Google login failed"));
        }
        Ok(start.auth_url)
    }

    /// Finish Google sign-in from the callback URL (or just its query).
    pub fn complete_oauth(&self, callback: &str) -> Result<SessionCredential, SessionError> {
        let token = query_param(callback, "token")
            .ok_or(SessionError::Invalid("Sign-in link has no token"))?;
        let credential = SessionCredential::new(token, None);
        self.store().set(credential.clone())?;
        info!("Signed in with Google");
        Ok(credential)
    }

    pub async fn forgot_password(&self, email: &str) -> Result<String, SessionError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(SessionError::Invalid("Email is required"));
        }
        let response = self.api.forgot_password(email).await?;
        Ok(response.message_or(RESET_LINK_SENT))
    }

    pub async fn reset_password(
        &self,
        token: Option<&str>,
        password: &str,
        confirm: &str,
    ) -> Result<String, SessionError> {
        if password.is_empty() || confirm.is_empty() {
            return Err(SessionError::Invalid("All fields are required"));
        }
        if password != confirm {
            return Err(SessionError::Invalid("Passwords do not match"));
        }
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(SessionError::Invalid("Invalid or expired link"))?;

        let request = ResetPasswordRequest {
            token: token.to_string(),
            password: password.to_string(),
        };
        let response = self.api.reset_password(&request).await?;
        Ok(response.message_or(PASSWORD_UPDATED))
    }

    pub fn logout(&self) -> Result<(), StoreError> {
        self.store().clear()?;
        info!("Signed out");
        Ok(())
    }

    /// Await a call that needs a session. If the backend rejects the
    /// credential the store is cleared before the error is handed back, so
    /// the next guard check sends the user to login. A credential stored
    /// while the call was in flight is left alone.
    pub async fn protected<T, F>(&self, call: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        let sent = self.store().token();
        match call.await {
            Err(e) if e.is_auth_failure() => {
                if let Some(token) = sent {
                    match self.store().clear_token(&token) {
                        Ok(true) => {
                            warn!(status = ?e.status(), "Session rejected by backend, signed out")
                        }
                        Ok(false) => {
                            debug!(status = ?e.status(), "Rejected credential already replaced")
                        }
                        Err(clear_err) => {
                            error!(error = %clear_err, "Failed to clear rejected session")
                        }
                    }
                }
                Err(e)
            }
            other => other,
        }
    }

    pub async fn whoami(&self) -> Result<Account, ApiError> {
        self.protected(self.api.me()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryBackend;
    use crate::router::{Navigator, Route, RouteGuard};
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn session_at(server: &Server, backend: MemoryBackend) -> Session {
        let store = Arc::new(TokenStore::new(backend));
        Session::new(ApiClient::new(server.url(), store).expect("client"))
    }

    #[tokio::test]
    async fn test_login_stores_credential() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth/login")
            .match_body(Matcher::Json(json!({"email": "agent@example.com", "password": "pw"})))
            .with_status(200)
            .with_body(r#"{"access_token": "jwt-1", "token_type": "bearer"}"#)
            .create_async()
            .await;

        let backend = MemoryBackend::new();
        let session = session_at(&server, backend.clone());
        let credential = session.login(" agent@example.com ", "pw").await.expect("login");

        assert_eq!(credential.token, "jwt-1");
        assert_eq!(credential.email.as_deref(), Some("agent@example.com"));
        assert_eq!(backend.stored(), Some(credential));
    }

    #[tokio::test]
    async fn test_login_unverified_email_message() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth/login")
            .with_status(403)
            .with_body(r#"{"detail": "Please verify your email first"}"#)
            .create_async()
            .await;

        let session = session_at(&server, MemoryBackend::new());
        let err = session.login("a@b.co", "pw").await.expect_err("403");
        assert_eq!(err.message(), "Please verify your email first");
        assert!(session.current().is_none());
    }

    #[tokio::test]
    async fn test_login_requires_fields() {
        let server = Server::new_async().await;
        let session = session_at(&server, MemoryBackend::new());
        let err = session.login("  ", "pw").await.expect_err("invalid");
        assert!(matches!(err, SessionError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_register_awaiting_verification() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth/register")
            .match_body(Matcher::Json(json!({
                "email": "a@b.co",
                "password": "pw",
                "brokerage_name": "Acme Realty",
                "industry": "real_estate"
            })))
            .with_status(200)
            .with_body(r#"{"status": "verification_sent", "message": "Check your email to verify your account"}"#)
            .create_async()
            .await;

        let session = session_at(&server, MemoryBackend::new());
        let outcome = session
            .register("a@b.co", "pw", "Acme Realty", None)
            .await
            .expect("register");
        assert_eq!(
            outcome,
            Registration::VerificationSent("Check your email to verify your account".into())
        );
        assert!(session.current().is_none());
    }

    #[tokio::test]
    async fn test_register_with_token_signs_in() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth/register")
            .with_status(200)
            .with_body(r#"{"access_token": "jwt-new"}"#)
            .create_async()
            .await;

        let session = session_at(&server, MemoryBackend::new());
        let outcome = session
            .register("a@b.co", "pw", "Acme", Some("insurance"))
            .await
            .expect("register");
        assert!(matches!(outcome, Registration::SignedIn(_)));
        assert_eq!(session.store().token().as_deref(), Some("jwt-new"));
    }

    #[tokio::test]
    async fn test_oauth_callback() {
        let server = Server::new_async().await;
        let session = session_at(&server, MemoryBackend::new());

        let err = session
            .complete_oauth("http://localhost:5173/oauth-success")
            .expect_err("no token");
        assert!(matches!(err, SessionError::Invalid(_)));
        assert!(session.current().is_none());

        session
            .complete_oauth("http://localhost:5173/oauth-success?token=g-jwt")
            .expect("signed in");
        assert_eq!(session.store().token().as_deref(), Some("g-jwt"));
    }

    #[tokio::test]
    async fn test_reset_password_validation() {
        let server = Server::new_async().await;
        let session = session_at(&server, MemoryBackend::new());

        let err = session
            .reset_password(Some("t"), "one", "two")
            .await
            .expect_err("mismatch");
        assert_eq!(err.message(), "Passwords do not match");

        let err = session
            .reset_password(None, "same", "same")
            .await
            .expect_err("no token");
        assert_eq!(err.message(), "Invalid or expired link");
    }

    #[tokio::test]
    async fn test_reset_password_sends_token() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/auth/reset-password")
            .match_body(Matcher::Json(json!({"token": "r-1", "password": "new-pw"})))
            .with_status(200)
            .with_body(r#"{"message": "Password updated successfully"}"#)
            .create_async()
            .await;

        let session = session_at(&server, MemoryBackend::new());
        let message = session
            .reset_password(Some("r-1"), "new-pw", "new-pw")
            .await
            .expect("reset");
        assert_eq!(message, "Password updated successfully");
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_logout_clears_backend() {
        let server = Server::new_async().await;
        let backend = MemoryBackend::with_credential(SessionCredential::new("old", None));
        let session = session_at(&server, backend.clone());

        session.logout().expect("logout");
        session.logout().expect("second logout");
        assert!(session.current().is_none());
        assert!(backend.stored().is_none());
    }

    #[tokio::test]
    async fn test_protected_call_rejected_signs_out_and_guard_redirects() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/leads/stats")
            .match_header("authorization", "Bearer expired")
            .with_status(401)
            .with_body(r#"{"detail": "Invalid token"}"#)
            .create_async()
            .await;

        let backend = MemoryBackend::with_credential(SessionCredential::new("expired", None));
        let session = session_at(&server, backend.clone());
        let guard = RouteGuard::new(Arc::clone(session.store()));
        let mut nav = Navigator::new(Route::Login);
        assert_eq!(guard.navigate(&mut nav, Route::Dashboard), Route::Dashboard);

        let err = session
            .protected(session.api().lead_stats())
            .await
            .expect_err("401");
        assert!(err.is_auth_failure());
        assert!(session.current().is_none());
        assert!(backend.stored().is_none());

        assert_eq!(guard.enforce(&mut nav), Route::Login);
        assert_eq!(nav.current(), Route::Login);
    }

    #[tokio::test]
    async fn test_rejection_of_old_token_keeps_newer_login() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/leads/stats")
            .match_header("authorization", "Bearer old")
            .with_status(401)
            .with_body(r#"{"detail": "Invalid token"}"#)
            .create_async()
            .await;

        let backend = MemoryBackend::with_credential(SessionCredential::new("old", None));
        let session = session_at(&server, backend.clone());
        let store = Arc::clone(session.store());

        // Signed in again while the old request was in flight
        let err = session
            .protected(async {
                let result = session.api().lead_stats().await;
                store
                    .set(SessionCredential::new("fresh", None))
                    .expect("set");
                result
            })
            .await
            .expect_err("401");

        assert!(err.is_auth_failure());
        assert_eq!(session.store().token().as_deref(), Some("fresh"));
        assert_eq!(backend.stored().map(|c| c.token).as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn test_protected_keeps_session_on_other_errors() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/leads/stats")
            .with_status(500)
            .with_body(r#"{"detail": "boom"}"#)
            .create_async()
            .await;

        let backend = MemoryBackend::with_credential(SessionCredential::new("tok", None));
        let session = session_at(&server, backend);
        let err = session
            .protected(session.api().lead_stats())
            .await
            .expect_err("500");
        assert!(err.is_server_error());
        assert!(session.current().is_some());
    }

    #[tokio::test]
    async fn test_whoami() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/v1/auth/me")
            .with_status(200)
            .with_body(r#"{"sub": "agent@example.com", "brokerage_id": 4}"#)
            .create_async()
            .await;

        let backend = MemoryBackend::with_credential(SessionCredential::new("tok", None));
        let session = session_at(&server, backend);
        let account = session.whoami().await.expect("me");
        assert_eq!(account.display_email(), Some("agent@example.com"));
    }
}

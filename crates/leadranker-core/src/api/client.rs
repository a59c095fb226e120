//! API client for communicating with the LeadRanker backend.
//!
//! `ApiClient` is the single chokepoint for backend traffic: it resolves the
//! current credential from the `TokenStore`, builds headers, encodes bodies,
//! decodes responses and turns every failure into an `ApiError`. It never
//! writes to the store and never retries.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::TokenStore;
use crate::config::Config;

use super::ApiError;

/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Arc<str>,
    store: Arc<TokenStore>,
}

impl ApiClient {
    /// Create a client against `base_url` with no overall request timeout.
    pub fn new(base_url: impl AsRef<str>, store: Arc<TokenStore>) -> Result<Self, ApiError> {
        Self::build(base_url.as_ref(), store, None)
    }

    pub fn from_config(config: &Config, store: Arc<TokenStore>) -> Result<Self, ApiError> {
        let timeout = (config.request_timeout_secs > 0)
            .then(|| Duration::from_secs(config.request_timeout_secs));
        Self::build(config.base_url(), store, timeout)
    }

    fn build(
        base_url: &str,
        store: Arc<TokenStore>,
        timeout: Option<Duration>,
    ) -> Result<Self, ApiError> {
        let mut builder = Client::builder()
            .user_agent(concat!("leadranker/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            store,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn store(&self) -> &Arc<TokenStore> {
        &self.store
    }

    /// Issue a call and return the decoded JSON body as-is.
    pub async fn request_json(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        self.send(method, path, &[], body).await
    }

    /// Issue a call and decode the body into `T`.
    pub async fn request<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(method, path, &[], body).await
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send::<T, ()>(Method::GET, path, &[], None).await
    }

    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        self.send::<T, ()>(Method::GET, path, query, None).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(Method::POST, path, &[], Some(body)).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(Method::PUT, path, &[], Some(body)).await
    }

    fn url(&self, path: &str) -> Result<String, ApiError> {
        if path.is_empty() {
            return Err(ApiError::InvalidRequest("endpoint path is empty".to_string()));
        }
        if !path.starts_with('/') || path.starts_with("//") {
            return Err(ApiError::InvalidRequest(format!(
                "endpoint path must be relative to the API base, got {:?}",
                path
            )));
        }
        Ok(format!("{}{}", self.base_url, path))
    }

    /// Headers for one call: bearer credential iff one is live right now,
    /// JSON content type iff a body is sent.
    fn headers(&self, has_body: bool) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        if let Some(token) = self.store.token() {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::InvalidRequest("credential is not a valid header value".to_string()))?;
            headers.insert(header::AUTHORIZATION, value);
        }
        if has_body {
            headers.insert(
                header::CONTENT_TYPE,
                header::HeaderValue::from_static("application/json"),
            );
        }
        Ok(headers)
    }

    async fn send<T, B>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(path)?;
        let headers = self.headers(body.is_some())?;
        let authenticated = headers.contains_key(header::AUTHORIZATION);

        let mut request = self.client.request(method.clone(), &url).headers(headers);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            let encoded = serde_json::to_vec(body)
                .map_err(|e| ApiError::InvalidRequest(format!("body is not serializable: {}", e)))?;
            request = request.body(encoded);
        }

        debug!(%method, path, authenticated, "API request");
        let response = request.send().await.map_err(|e| {
            warn!(%method, path, error = %e, "API request failed to complete");
            ApiError::from(e)
        })?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            warn!(
                %method,
                path,
                status = status.as_u16(),
                body = %ApiError::truncate_body(&text),
                "API request rejected"
            );
            return Err(ApiError::from_status(status, &text));
        }

        Self::decode(&method, path, status, &text)
    }

    fn decode<T: DeserializeOwned>(
        method: &Method,
        path: &str,
        status: StatusCode,
        text: &str,
    ) -> Result<T, ApiError> {
        // 204 and friends decode as JSON null
        let text = if text.trim().is_empty() { "null" } else { text };
        serde_json::from_str(text).map_err(|e| {
            warn!(%method, path, status = status.as_u16(), error = %e, "Response did not match schema");
            ApiError::Decode(format!("{} {}: {}", method, path, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SessionCredential;
    use crate::models::LeadStats;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn store_with(token: Option<&str>) -> Arc<TokenStore> {
        let store = TokenStore::in_memory();
        if let Some(token) = token {
            store
                .set(SessionCredential::new(token, None))
                .expect("set credential");
        }
        Arc::new(store)
    }

    #[tokio::test]
    async fn test_bearer_attached_when_present() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/leads/stats")
            .match_header("authorization", "Bearer tok-123")
            .match_header("content-type", Matcher::Missing)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"total": 1}"#)
            .create_async()
            .await;

        let client = ApiClient::new(server.url(), store_with(Some("tok-123"))).expect("client");
        let _: Value = client.get("/leads/stats").await.expect("ok");
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_no_bearer_when_absent() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/auth/login")
            .match_header("authorization", Matcher::Missing)
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({"email": "a@b.co", "password": "pw"})))
            .with_status(200)
            .with_body(r#"{"access_token": "jwt"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(server.url(), store_with(None)).expect("client");
        let body = json!({"email": "a@b.co", "password": "pw"});
        let resp = client
            .request_json(Method::POST, "/auth/login", Some(&body))
            .await
            .expect("ok");
        assert_eq!(resp["access_token"], "jwt");
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_credential_resolved_per_call() {
        let mut server = Server::new_async().await;
        let store = store_with(Some("first"));
        let client = ApiClient::new(server.url(), Arc::clone(&store)).expect("client");

        let first = server
            .mock("GET", "/api/v1/auth/me")
            .match_header("authorization", "Bearer first")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        let _: Value = client.get("/api/v1/auth/me").await.expect("ok");
        first.assert_async().await;

        store.clear().expect("clear");
        let after_logout = server
            .mock("GET", "/api/v1/auth/me")
            .match_header("authorization", Matcher::Missing)
            .with_status(401)
            .with_body(r#"{"detail": "Not authenticated"}"#)
            .create_async()
            .await;
        let err = client.get::<Value>("/api/v1/auth/me").await.expect_err("401");
        assert!(err.is_auth_failure());
        after_logout.assert_async().await;
    }

    #[tokio::test]
    async fn test_stats_returned_unmodified() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/leads/stats")
            .with_status(200)
            .with_body(r#"{"total": 12, "hot": 3}"#)
            .create_async()
            .await;

        let client = ApiClient::new(server.url(), store_with(Some("t"))).expect("client");
        let raw = client
            .request_json(Method::GET, "/leads/stats", None)
            .await
            .expect("ok");
        assert_eq!(raw, json!({"total": 12, "hot": 3}));

        let typed: LeadStats = client.get("/leads/stats").await.expect("ok");
        assert_eq!(typed.total, 12);
        assert_eq!(typed.hot, 3);
    }

    #[tokio::test]
    async fn test_detail_message_surfaced() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth/register")
            .with_status(400)
            .with_body(r#"{"detail": "Email already registered"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(server.url(), store_with(None)).expect("client");
        let err = client
            .post::<Value, _>("/auth/register", &json!({"email": "a@b.co"}))
            .await
            .expect_err("400");
        assert_eq!(err.message(), "Email already registered");
        assert_eq!(err.status(), Some(400));
    }

    #[tokio::test]
    async fn test_auth_failure_leaves_store_alone() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/leads/stats")
            .with_status(401)
            .with_body(r#"{"detail": "Invalid token"}"#)
            .create_async()
            .await;

        let store = store_with(Some("stale"));
        let client = ApiClient::new(server.url(), Arc::clone(&store)).expect("client");
        let err = client.get::<Value>("/leads/stats").await.expect_err("401");
        assert!(err.is_auth_failure());
        assert!(store.is_present());
    }

    #[tokio::test]
    async fn test_schema_mismatch_is_decode_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/leads/stats")
            .with_status(200)
            .with_body(r#"{"total": "lots"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(server.url(), store_with(Some("t"))).expect("client");
        let err = client.get::<LeadStats>("/leads/stats").await.expect_err("decode");
        assert!(matches!(err, ApiError::Decode(_)));
        assert_eq!(err.status(), None);
    }

    #[tokio::test]
    async fn test_empty_success_body_is_null() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth/forgot-password")
            .with_status(204)
            .create_async()
            .await;

        let client = ApiClient::new(server.url(), store_with(None)).expect("client");
        let resp = client
            .request_json(Method::POST, "/auth/forgot-password", Some(&json!({"email": "a@b.co"})))
            .await
            .expect("ok");
        assert_eq!(resp, Value::Null);
    }

    #[tokio::test]
    async fn test_invalid_paths_rejected_before_sending() {
        let client = ApiClient::new("http://127.0.0.1:9", store_with(None)).expect("client");
        for path in ["", "leads/stats", "//evil.example.com/x"] {
            let err = client
                .request_json(Method::GET, path, None)
                .await
                .expect_err("invalid");
            assert!(matches!(err, ApiError::InvalidRequest(_)), "path {:?}", path);
        }
    }

    #[tokio::test]
    async fn test_transport_failure_is_network_error() {
        // Nothing listens on the discard port
        let client = ApiClient::new("http://127.0.0.1:9", store_with(None)).expect("client");
        let err = client
            .request_json(Method::GET, "/leads/stats", None)
            .await
            .expect_err("network");
        assert!(matches!(err, ApiError::Network(_)));
        assert!(!err.is_auth_failure());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ApiClient::new("http://localhost:8000/", store_with(None)).expect("client");
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.url("/leads/stats").expect("url"), "http://localhost:8000/leads/stats");
    }
}

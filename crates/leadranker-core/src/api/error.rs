use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Message used when a failed response carries no usable `detail`
pub const FALLBACK_MESSAGE: &str = "Request failed";

/// Every way a call to the backend can fail.
///
/// Status-bearing variants display as the backend's message verbatim so a
/// screen can show `err.to_string()` next to the form that triggered it.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// 401 or 403: the credential is missing, expired or refused.
    #[error("{message}")]
    Unauthorized { status: u16, message: String },

    /// Any other 4xx, e.g. validation or quota failures.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("{message}")]
    UnexpectedStatus { status: u16, message: String },

    /// A 2xx body that does not match the expected schema.
    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Maximum length for error response bodies in log lines
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    pub fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = detail_message(body).unwrap_or_else(|| FALLBACK_MESSAGE.to_string());
        let status = status.as_u16();
        match status {
            401 | 403 => ApiError::Unauthorized { status, message },
            400..=499 => ApiError::Rejected { status, message },
            500..=599 => ApiError::Server { status, message },
            _ => ApiError::UnexpectedStatus { status, message },
        }
    }

    /// True for 401/403. Callers must clear the session and go to login.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    pub fn is_server_error(&self) -> bool {
        matches!(self, ApiError::Server { .. })
    }

    /// HTTP status, when the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { status, .. }
            | ApiError::Rejected { status, .. }
            | ApiError::Server { status, .. }
            | ApiError::UnexpectedStatus { status, .. } => Some(*status),
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            ApiError::Decode(_) | ApiError::InvalidRequest(_) => None,
        }
    }

    /// Human-readable message suitable for showing next to a form.
    pub fn message(&self) -> String {
        match self {
            ApiError::Unauthorized { message, .. }
            | ApiError::Rejected { message, .. }
            | ApiError::Server { message, .. }
            | ApiError::UnexpectedStatus { message, .. } => message.clone(),
            ApiError::Network(e) if e.is_timeout() => {
                "Connection timed out. Please try again.".to_string()
            }
            ApiError::Network(_) => {
                "Unable to connect to server. Check your internet connection.".to_string()
            }
            ApiError::Decode(_) => "Unexpected response from server".to_string(),
            ApiError::InvalidRequest(reason) => reason.clone(),
        }
    }
}

/// Pull the backend's error detail out of a failure body.
///
/// `detail` is usually a string; request validation failures carry a list of
/// `{ "msg": ... }` objects instead, in which case the first message is used.
fn detail_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let message = match value.get("detail")? {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items
            .iter()
            .find_map(|item| item.get("msg").and_then(Value::as_str))
            .map(str::to_string),
        Value::Object(obj) => obj.get("message").and_then(Value::as_str).map(str::to_string),
        _ => None,
    };
    message.filter(|m| !m.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_used_verbatim() {
        let err = ApiError::from_status(
            StatusCode::BAD_REQUEST,
            r#"{"detail": "Email already registered"}"#,
        );
        assert_eq!(err.message(), "Email already registered");
        assert_eq!(err.to_string(), "Email already registered");
        assert_eq!(err.status(), Some(400));
        assert!(!err.is_auth_failure());
    }

    #[test]
    fn test_fallback_message() {
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, "<html>oops</html>");
        assert_eq!(err.message(), FALLBACK_MESSAGE);

        let err = ApiError::from_status(StatusCode::BAD_REQUEST, r#"{"detail": ""}"#);
        assert_eq!(err.message(), FALLBACK_MESSAGE);

        let err = ApiError::from_status(StatusCode::BAD_REQUEST, "");
        assert_eq!(err.message(), FALLBACK_MESSAGE);
    }

    #[test]
    fn test_validation_detail_list() {
        let body = r#"{"detail": [{"loc": ["body", "email"], "msg": "field required", "type": "value_error.missing"}]}"#;
        let err = ApiError::from_status(StatusCode::UNPROCESSABLE_ENTITY, body);
        assert_eq!(err.message(), "field required");
        assert!(matches!(err, ApiError::Rejected { status: 422, .. }));
    }

    #[test]
    fn test_auth_failures() {
        for status in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
            let err = ApiError::from_status(status, r#"{"detail": "Invalid token"}"#);
            assert!(err.is_auth_failure());
            assert_eq!(err.message(), "Invalid token");
        }
    }

    #[test]
    fn test_server_errors_keep_status() {
        let err = ApiError::from_status(StatusCode::BAD_GATEWAY, "");
        assert!(err.is_server_error());
        assert_eq!(err.status(), Some(502));
        assert_eq!(err.message(), FALLBACK_MESSAGE);
    }

    #[test]
    fn test_payment_required_is_rejection() {
        let err = ApiError::from_status(StatusCode::PAYMENT_REQUIRED, r#"{"detail": "Quota exceeded"}"#);
        assert!(matches!(err, ApiError::Rejected { status: 402, .. }));
        assert_eq!(err.message(), "Quota exceeded");
    }

    #[test]
    fn test_truncate_body_is_char_safe() {
        let body = "é".repeat(400);
        let truncated = ApiError::truncate_body(&body);
        assert!(truncated.contains("truncated, 800 total bytes"));
        assert_eq!(ApiError::truncate_body("short"), "short");
    }
}

//! Failure taxonomy for solve/debug requests and HTTP response classification.

use regex::Regex;
use std::sync::LazyLock;

/// Marker the solving service puts in `{"error": ...}` when its own
/// processing deadline expired. Distinct from a transport timeout.
static REMOTE_TIMEOUT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)operation\s+timed\s+out").unwrap());

/// A 403 mentioning any of these is about billing, not identity.
static QUOTA_HINT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(credits?|quota|subscription)\b").unwrap());

const MAX_ERROR_BODY: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProcessingError {
    #[error("Request canceled")]
    Canceled,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Quota exhausted: {0}")]
    QuotaExhausted(String),

    #[error("Remote processing timed out: {0}")]
    RemoteTimeout(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Failed to read screenshot: {0}")]
    Io(String),
}

impl ProcessingError {
    /// The plain string shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            ProcessingError::Canceled => "Processing was canceled by the user.".to_string(),
            ProcessingError::Unauthorized(_) => {
                "Your session has expired. Please sign in again.".to_string()
            }
            ProcessingError::QuotaExhausted(_) => {
                "You are out of credits. Please upgrade your plan to continue.".to_string()
            }
            ProcessingError::RemoteTimeout(_) => {
                "The request timed out. Please try again with fewer screenshots.".to_string()
            }
            ProcessingError::Server { message, .. } if !message.trim().is_empty() => {
                message.clone()
            }
            ProcessingError::Server { .. } => "Server error. Please try again.".to_string(),
            ProcessingError::Network(_) => {
                "Network error. Please check your connection and try again.".to_string()
            }
            ProcessingError::InvalidResponse(_) => {
                "Received an unexpected response from the server. Please try again.".to_string()
            }
            ProcessingError::Io(detail) => format!("Could not read screenshots: {}", detail),
        }
    }

    pub fn is_remote_timeout(&self) -> bool {
        matches!(self, ProcessingError::RemoteTimeout(_))
    }
}

impl From<reqwest::Error> for ProcessingError {
    fn from(e: reqwest::Error) -> Self {
        ProcessingError::Network(e.to_string())
    }
}

/// Classify an HTTP response into the JSON payload or a typed failure.
///
/// The remote timeout marker wins over the status code; a 2xx body that is
/// not JSON is `InvalidResponse`.
pub fn classify_response(status: u16, body: &str) -> Result<serde_json::Value, ProcessingError> {
    let json = serde_json::from_str::<serde_json::Value>(body).ok();
    let error_text = json
        .as_ref()
        .and_then(|j| j.get("error"))
        .and_then(|e| e.as_str())
        .map(str::to_string);

    if let Some(text) = &error_text {
        if REMOTE_TIMEOUT.is_match(text) {
            return Err(ProcessingError::RemoteTimeout(text.clone()));
        }
    }

    // Only a string `error` fails a 2xx; `"error": null` is a normal payload.
    let has_error = error_text.is_some();
    let message = error_text.unwrap_or_else(|| truncate(body.trim(), MAX_ERROR_BODY));

    match status {
        200..=299 => match json {
            Some(_) if has_error => Err(ProcessingError::Server { status, message }),
            Some(payload) => Ok(payload),
            None => Err(ProcessingError::InvalidResponse(message)),
        },
        401 => Err(ProcessingError::Unauthorized(message)),
        402 => Err(ProcessingError::QuotaExhausted(message)),
        403 if QUOTA_HINT.is_match(&message) => Err(ProcessingError::QuotaExhausted(message)),
        403 => Err(ProcessingError::Unauthorized(message)),
        _ => Err(ProcessingError::Server { status, message }),
    }
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_returns_payload() {
        let payload = classify_response(200, r#"{"code":"x"}"#).unwrap();
        assert_eq!(payload["code"], "x");
    }

    #[test]
    fn null_error_field_does_not_fail_success() {
        let payload = classify_response(200, r#"{"code":"x","error":null}"#).unwrap();
        assert_eq!(payload["code"], "x");

        assert!(matches!(
            classify_response(200, r#"{"code":"x","error":"model refused"}"#),
            Err(ProcessingError::Server { status: 200, .. })
        ));
    }

    #[test]
    fn timeout_marker_wins_over_status() {
        for status in [200, 500, 504] {
            let err = classify_response(status, r#"{"error":"Operation timed out after 60s"}"#)
                .unwrap_err();
            assert!(err.is_remote_timeout(), "status {} gave {:?}", status, err);
        }
    }

    #[test]
    fn auth_and_billing_statuses() {
        assert!(matches!(
            classify_response(401, r#"{"error":"bad token"}"#),
            Err(ProcessingError::Unauthorized(m)) if m == "bad token"
        ));
        assert!(matches!(
            classify_response(402, ""),
            Err(ProcessingError::QuotaExhausted(_))
        ));
        assert!(matches!(
            classify_response(403, r#"{"error":"No credits remaining"}"#),
            Err(ProcessingError::QuotaExhausted(_))
        ));
        assert!(matches!(
            classify_response(403, r#"{"error":"Forbidden"}"#),
            Err(ProcessingError::Unauthorized(_))
        ));
    }

    #[test]
    fn other_failures_are_server_errors() {
        assert_eq!(
            classify_response(500, "upstream exploded"),
            Err(ProcessingError::Server {
                status: 500,
                message: "upstream exploded".to_string()
            })
        );
        assert!(matches!(
            classify_response(422, r#"{"error":"bad image"}"#),
            Err(ProcessingError::Server { status: 422, .. })
        ));
    }

    #[test]
    fn non_json_success_is_invalid() {
        assert!(matches!(
            classify_response(200, "<html>"),
            Err(ProcessingError::InvalidResponse(_))
        ));
    }

    #[test]
    fn user_messages_follow_the_taxonomy() {
        assert_eq!(
            ProcessingError::Unauthorized(String::new()).user_message(),
            "Your session has expired. Please sign in again."
        );
        assert_eq!(
            ProcessingError::QuotaExhausted(String::new()).user_message(),
            "You are out of credits. Please upgrade your plan to continue."
        );
        assert_eq!(
            ProcessingError::Server { status: 500, message: "  ".to_string() }.user_message(),
            "Server error. Please try again."
        );
        assert_eq!(
            ProcessingError::Server { status: 500, message: "Invalid language".to_string() }
                .user_message(),
            "Invalid language"
        );
        assert_eq!(
            ProcessingError::Canceled.user_message(),
            "Processing was canceled by the user."
        );
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(1000);
        match classify_response(500, &body) {
            Err(ProcessingError::Server { message, .. }) => assert_eq!(message.len(), MAX_ERROR_BODY),
            other => panic!("unexpected {:?}", other),
        }
    }
}

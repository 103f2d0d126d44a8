//! Request and response types for the remote solving API.
//!
//! Both endpoints take the same request body and return the same shape;
//! the field names match the service's JSON exactly.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Body of `POST /solve` and `POST /debug`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveRequest {
    /// Base64-encoded PNGs, oldest first.
    pub images: Vec<String>,
    pub language: String,
    pub locale: String,
    pub is_mock: bool,
}

/// A proposed solution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveResponse {
    pub code: String,
    pub thoughts: Vec<String>,
    pub time_complexity: String,
    pub space_complexity: String,
}

/// A revised solution from a debug pass. Same shape as a solve.
pub type DebugResponse = SolveResponse;

/// Extra HTTP headers for one request (auth, mostly).
pub type RequestHeaders = BTreeMap<String, String>;

/// Build the header set for a request. `None` means no auth header,
/// which is what self-hosted deployments send.
pub fn auth_headers(token: Option<&str>) -> RequestHeaders {
    let mut headers = RequestHeaders::new();
    if let Some(token) = token {
        headers.insert("Authorization".to_string(), format!("Bearer {}", token));
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_camel_case_mock_flag() {
        let req = SolveRequest {
            images: vec!["aGk=".to_string()],
            language: "rust".to_string(),
            locale: "en-US".to_string(),
            is_mock: true,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["isMock"], true);
        assert_eq!(json["images"][0], "aGk=");
    }

    #[test]
    fn auth_header_is_bearer_or_absent() {
        assert_eq!(
            auth_headers(Some("tok")).get("Authorization").map(String::as_str),
            Some("Bearer tok")
        );
        assert!(auth_headers(None).is_empty());
    }
}

//! LEETCODE_SOLVER request strategy.
//!
//! Tags requests with `problemSource: "leetcode"` and tolerates the looser
//! response the practice endpoints return (thoughts as one string,
//! complexities sometimes omitted).

use super::cancel::CancelSignal;
use super::client::SolverClient;
use super::error::ProcessingError;
use super::types::{DebugResponse, RequestHeaders, SolveRequest, SolveResponse};
use super::SolveStrategy;
use crate::mode::AppMode;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const SOLVE_PATH: &str = "/api/leetcode/solve";
const DEBUG_PATH: &str = "/api/leetcode/debug";
const PROBLEM_SOURCE: &str = "leetcode";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LeetcodeBody<'a> {
    #[serde(flatten)]
    request: &'a SolveRequest,
    problem_source: &'static str,
}

#[derive(Deserialize, Default)]
#[serde(untagged)]
enum Thoughts {
    List(Vec<String>),
    Text(String),
    #[default]
    Missing,
}

#[derive(Deserialize)]
struct LooseResponse {
    code: String,
    #[serde(default)]
    thoughts: Thoughts,
    #[serde(default)]
    time_complexity: String,
    #[serde(default)]
    space_complexity: String,
}

pub struct LeetcodeStrategy {
    client: SolverClient,
}

impl LeetcodeStrategy {
    pub fn new(client: SolverClient) -> Self {
        Self { client }
    }

    async fn call(
        &self,
        path: &str,
        request: &SolveRequest,
        headers: &RequestHeaders,
        signal: CancelSignal,
    ) -> Result<SolveResponse, ProcessingError> {
        let body = LeetcodeBody {
            request,
            problem_source: PROBLEM_SOURCE,
        };
        let payload = self.client.post_json(path, &body, headers, signal).await?;
        decode(payload)
    }
}

#[async_trait]
impl SolveStrategy for LeetcodeStrategy {
    fn mode(&self) -> AppMode {
        AppMode::LeetcodeSolver
    }

    async fn solve(
        &self,
        request: &SolveRequest,
        headers: &RequestHeaders,
        signal: CancelSignal,
    ) -> Result<SolveResponse, ProcessingError> {
        self.call(SOLVE_PATH, request, headers, signal).await
    }

    async fn debug(
        &self,
        request: &SolveRequest,
        headers: &RequestHeaders,
        signal: CancelSignal,
    ) -> Result<DebugResponse, ProcessingError> {
        self.call(DEBUG_PATH, request, headers, signal).await
    }
}

fn decode(payload: serde_json::Value) -> Result<SolveResponse, ProcessingError> {
    let loose: LooseResponse = serde_json::from_value(payload)
        .map_err(|e| ProcessingError::InvalidResponse(e.to_string()))?;

    let thoughts = match loose.thoughts {
        Thoughts::List(list) => list,
        Thoughts::Text(text) => text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        Thoughts::Missing => Vec::new(),
    };

    Ok(SolveResponse {
        code: loose.code,
        thoughts,
        time_complexity: loose.time_complexity,
        space_complexity: loose.space_complexity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_carries_problem_source_next_to_request_fields() {
        let request = SolveRequest {
            images: vec![],
            language: "python".to_string(),
            locale: "en-US".to_string(),
            is_mock: false,
        };
        let body = serde_json::to_value(LeetcodeBody {
            request: &request,
            problem_source: PROBLEM_SOURCE,
        })
        .unwrap();
        assert_eq!(body["problemSource"], "leetcode");
        assert_eq!(body["language"], "python");
        assert_eq!(body["isMock"], false);
    }

    #[test]
    fn text_thoughts_are_split_into_lines() {
        let resp = decode(serde_json::json!({
            "code": "pass",
            "thoughts": "two pointers\n\n  sort first  ",
        }))
        .unwrap();
        assert_eq!(resp.thoughts, vec!["two pointers", "sort first"]);
        assert_eq!(resp.time_complexity, "");
    }

    #[test]
    fn list_thoughts_pass_through() {
        let resp = decode(serde_json::json!({
            "code": "pass",
            "thoughts": ["a", "b"],
            "time_complexity": "O(1)",
            "space_complexity": "O(1)"
        }))
        .unwrap();
        assert_eq!(resp.thoughts, vec!["a", "b"]);
    }

    #[test]
    fn missing_code_is_invalid() {
        assert!(matches!(
            decode(serde_json::json!({ "thoughts": [] })),
            Err(ProcessingError::InvalidResponse(_))
        ));
    }
}

//! LIVE_INTERVIEW request strategy.
//!
//! Plain request body, strict response decoding: `thoughts` must be an
//! array, as the interview service always sends it.

use super::cancel::CancelSignal;
use super::client::SolverClient;
use super::error::ProcessingError;
use super::types::{DebugResponse, RequestHeaders, SolveRequest, SolveResponse};
use super::SolveStrategy;
use crate::mode::AppMode;
use async_trait::async_trait;

const SOLVE_PATH: &str = "/api/solve";
const DEBUG_PATH: &str = "/api/debug";

pub struct LiveInterviewStrategy {
    client: SolverClient,
}

impl LiveInterviewStrategy {
    pub fn new(client: SolverClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SolveStrategy for LiveInterviewStrategy {
    fn mode(&self) -> AppMode {
        AppMode::LiveInterview
    }

    async fn solve(
        &self,
        request: &SolveRequest,
        headers: &RequestHeaders,
        signal: CancelSignal,
    ) -> Result<SolveResponse, ProcessingError> {
        let payload = self.client.post_json(SOLVE_PATH, request, headers, signal).await?;
        decode(payload)
    }

    async fn debug(
        &self,
        request: &SolveRequest,
        headers: &RequestHeaders,
        signal: CancelSignal,
    ) -> Result<DebugResponse, ProcessingError> {
        let payload = self.client.post_json(DEBUG_PATH, request, headers, signal).await?;
        decode(payload)
    }
}

fn decode(payload: serde_json::Value) -> Result<SolveResponse, ProcessingError> {
    serde_json::from_value(payload).map_err(|e| ProcessingError::InvalidResponse(e.to_string()))
}

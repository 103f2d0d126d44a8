//! Solver domain: per-mode request strategies for the remote solving API.
//!
//! Public API for talking to the solving service.
//! External code should only use what is exported here.
//!
//! Strategies:
//!   - LIVE_INTERVIEW (live_interview.rs)
//!   - LEETCODE_SOLVER (leetcode.rs)
//!
//! Shared:
//!   - client.rs: HTTP POST raced against cancellation, 300s cap
//!   - error.rs: failure taxonomy + response classification
//!   - cancel.rs: cancel handle/signal pairs
//!   - registry.rs: mode → strategy lookup with fallback

pub mod cancel;
pub mod client;
pub mod error;
mod leetcode;
mod live_interview;
pub mod registry;
pub mod types;

pub use cancel::{cancel_pair, CancelHandle, CancelSignal};
pub use client::{SolverClient, REQUEST_TIMEOUT_SECS};
pub use error::ProcessingError;
pub use leetcode::LeetcodeStrategy;
pub use live_interview::LiveInterviewStrategy;
pub use registry::StrategyRegistry;
pub use types::{auth_headers, DebugResponse, RequestHeaders, SolveRequest, SolveResponse};

use crate::mode::AppMode;
use async_trait::async_trait;

/// How one app mode shapes solve/debug requests and reads their replies.
///
/// Implementations must honour `signal` (returning `ProcessingError::Canceled`)
/// and must not retry.
#[async_trait]
pub trait SolveStrategy: Send + Sync {
    fn mode(&self) -> AppMode;

    async fn solve(
        &self,
        request: &SolveRequest,
        headers: &RequestHeaders,
        signal: CancelSignal,
    ) -> Result<SolveResponse, ProcessingError>;

    async fn debug(
        &self,
        request: &SolveRequest,
        headers: &RequestHeaders,
        signal: CancelSignal,
    ) -> Result<DebugResponse, ProcessingError>;
}

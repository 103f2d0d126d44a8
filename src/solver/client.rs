//! HTTP transport shared by every strategy.
//!
//! One POST, raced against the caller's cancel signal, bounded by a fixed
//! transport timeout. Never retries; a re-run is the user's call.

use super::cancel::CancelSignal;
use super::error::{classify_response, ProcessingError};
use super::types::RequestHeaders;
use serde::Serialize;
use std::time::Duration;

/// Upper bound on a single request, enforced by the HTTP client.
pub const REQUEST_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone)]
pub struct SolverClient {
    http: reqwest::Client,
    base_url: String,
}

impl SolverClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ProcessingError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// POST `body` as JSON to `path` and classify the reply.
    pub async fn post_json<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
        headers: &RequestHeaders,
        mut signal: CancelSignal,
    ) -> Result<serde_json::Value, ProcessingError> {
        if signal.is_cancelled() {
            return Err(ProcessingError::Canceled);
        }

        let url = self.endpoint(path);
        let mut request = self.http.post(&url).json(body);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let start = std::time::Instant::now();
        let exchange = async {
            let response = request.send().await?;
            let status = response.status().as_u16();
            let text = response.text().await?;
            Ok::<_, reqwest::Error>((status, text))
        };

        let (status, text) = tokio::select! {
            biased;
            _ = signal.cancelled() => {
                log::info!(
                    "[SOLVER] POST {} canceled after {}ms",
                    path,
                    start.elapsed().as_millis()
                );
                return Err(ProcessingError::Canceled);
            }
            result = exchange => match result {
                Ok(reply) => reply,
                Err(e) => {
                    log::error!("[SOLVER] POST {} failed: {}", path, e);
                    return Err(e.into());
                }
            },
        };

        log::info!(
            "[SOLVER] POST {} -> {} in {}ms ({} bytes)",
            path,
            status,
            start.elapsed().as_millis(),
            text.len()
        );
        classify_response(status, &text)
    }
}

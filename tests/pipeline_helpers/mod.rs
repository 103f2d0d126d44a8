//! Shared fakes for orchestrator tests: a scripted strategy, a PNG-producing
//! capture provider, a counting token store, and a harness that wires them.

#![allow(dead_code)]

use async_trait::async_trait;
use coder_overlay_lib::capture::{CaptureError, CaptureProvider};
use coder_overlay_lib::auth::TokenStore;
use coder_overlay_lib::mode::AppMode;
use coder_overlay_lib::notify::RecordingNotifier;
use coder_overlay_lib::pipeline::{Orchestrator, SessionObserver, SessionSnapshot};
use coder_overlay_lib::settings::Settings;
use coder_overlay_lib::solver::{
    CancelSignal, DebugResponse, ProcessingError, RequestHeaders, SolveRequest, SolveResponse,
    SolveStrategy, StrategyRegistry,
};
use std::collections::VecDeque;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// Fresh scratch directory for one test.
pub fn setup_test_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("co-pipeline-test-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn sample_response(code: &str) -> SolveResponse {
    SolveResponse {
        code: code.to_string(),
        thoughts: vec!["two pointers".to_string()],
        time_complexity: "O(n)".to_string(),
        space_complexity: "O(1)".to_string(),
    }
}

/// Every grab is a distinct 2x2 PNG, so files can be told apart.
pub struct FakeCapture {
    shade: AtomicU8,
}

impl FakeCapture {
    pub fn new() -> Self {
        Self {
            shade: AtomicU8::new(0),
        }
    }
}

#[async_trait]
impl CaptureProvider for FakeCapture {
    async fn capture(&self) -> Result<Vec<u8>, CaptureError> {
        let shade = self.shade.fetch_add(1, Ordering::SeqCst);
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([shade, 0, 0, 255]));
        let mut bytes = Cursor::new(Vec::new());
        img.write_to(&mut bytes, image::ImageFormat::Png)
            .map_err(|e| CaptureError::InvalidImage(e.to_string()))?;
        Ok(bytes.into_inner())
    }
}

pub struct CountingTokens {
    token: Option<String>,
    lookups: AtomicUsize,
}

impl CountingTokens {
    pub fn new(token: Option<&str>) -> Self {
        Self {
            token: token.map(str::to_string),
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl TokenStore for CountingTokens {
    fn token(&self) -> Option<String> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.token.clone()
    }
}

/// Replies from a queue (default: success). While held, calls park until
/// released or cancelled.
pub struct ScriptedStrategy {
    mode: AppMode,
    replies: Mutex<VecDeque<Result<SolveResponse, ProcessingError>>>,
    held: watch::Sender<bool>,
    calls: watch::Sender<usize>,
    requests: Mutex<Vec<(SolveRequest, RequestHeaders)>>,
}

impl ScriptedStrategy {
    pub fn new(mode: AppMode) -> Self {
        Self {
            mode,
            replies: Mutex::new(VecDeque::new()),
            held: watch::channel(false).0,
            calls: watch::channel(0).0,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn reply(&self, result: Result<SolveResponse, ProcessingError>) {
        self.replies.lock().unwrap().push_back(result);
    }

    pub fn hold(&self) {
        self.held.send_replace(true);
    }

    pub fn release(&self) {
        self.held.send_replace(false);
    }

    pub fn calls(&self) -> usize {
        *self.calls.borrow()
    }

    /// Resolves once `n` calls have reached the strategy.
    pub async fn wait_for_calls(&self, n: usize) {
        let mut calls = self.calls.subscribe();
        let _ = calls.wait_for(|c| *c >= n).await;
    }

    pub fn last_request(&self) -> Option<(SolveRequest, RequestHeaders)> {
        self.requests.lock().unwrap().last().cloned()
    }

    async fn respond(
        &self,
        request: &SolveRequest,
        headers: &RequestHeaders,
        mut signal: CancelSignal,
    ) -> Result<SolveResponse, ProcessingError> {
        self.requests
            .lock()
            .unwrap()
            .push((request.clone(), headers.clone()));
        self.calls.send_modify(|c| *c += 1);

        let mut held = self.held.subscribe();
        tokio::select! {
            _ = signal.cancelled() => return Err(ProcessingError::Canceled),
            _ = async { let _ = held.wait_for(|h| !*h).await; } => {}
        }
        if signal.is_cancelled() {
            return Err(ProcessingError::Canceled);
        }

        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(sample_response("default")))
    }
}

#[async_trait]
impl SolveStrategy for ScriptedStrategy {
    fn mode(&self) -> AppMode {
        self.mode
    }

    async fn solve(
        &self,
        request: &SolveRequest,
        headers: &RequestHeaders,
        signal: CancelSignal,
    ) -> Result<SolveResponse, ProcessingError> {
        self.respond(request, headers, signal).await
    }

    async fn debug(
        &self,
        request: &SolveRequest,
        headers: &RequestHeaders,
        signal: CancelSignal,
    ) -> Result<DebugResponse, ProcessingError> {
        self.respond(request, headers, signal).await
    }
}

#[derive(Default)]
pub struct RecordingObserver {
    snapshots: Mutex<Vec<SessionSnapshot>>,
}

impl RecordingObserver {
    pub fn last(&self) -> Option<SessionSnapshot> {
        self.snapshots.lock().unwrap().last().cloned()
    }

    pub fn count(&self) -> usize {
        self.snapshots.lock().unwrap().len()
    }
}

impl SessionObserver for RecordingObserver {
    fn session_changed(&self, snapshot: &SessionSnapshot) {
        self.snapshots.lock().unwrap().push(snapshot.clone());
    }
}

pub struct Harness {
    pub orchestrator: Arc<Orchestrator>,
    pub strategy: Arc<ScriptedStrategy>,
    pub tokens: Arc<CountingTokens>,
    pub notifier: Arc<RecordingNotifier>,
    pub dir: PathBuf,
}

impl Harness {
    pub fn new(name: &str) -> Self {
        Self::with(name, Some("test-token"), |_| {}, |registry| registry)
    }

    pub fn with_settings(name: &str, configure: impl FnOnce(&mut Settings)) -> Self {
        Self::with(name, Some("test-token"), configure, |registry| registry)
    }

    pub fn with(
        name: &str,
        token: Option<&str>,
        configure: impl FnOnce(&mut Settings),
        extend: impl FnOnce(StrategyRegistry) -> StrategyRegistry,
    ) -> Self {
        let dir = setup_test_dir(name);
        let mut settings = Settings {
            screenshot_dir: Some(dir.clone()),
            ..Settings::default()
        };
        configure(&mut settings);

        let strategy = Arc::new(ScriptedStrategy::new(AppMode::LiveInterview));
        let tokens = Arc::new(CountingTokens::new(token));
        let notifier = Arc::new(RecordingNotifier::new());
        let registry = extend(StrategyRegistry::new(strategy.clone()));

        let orchestrator = Orchestrator::new(
            &settings,
            registry,
            Arc::new(FakeCapture::new()),
            tokens.clone(),
            notifier.clone(),
        )
        .unwrap();

        Self {
            orchestrator: Arc::new(orchestrator),
            strategy,
            tokens,
            notifier,
            dir,
        }
    }

    /// Capture `n` screenshots, returning their paths in order.
    pub async fn capture(&self, n: usize) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        for _ in 0..n {
            paths.push(self.orchestrator.capture().await.unwrap().path);
        }
        paths
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

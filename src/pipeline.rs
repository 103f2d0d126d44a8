//! Processing orchestrator: capture → queue → solve/debug → view.
//!
//! One `Orchestrator` owns the whole session: both screenshot queues, the
//! view state machine, the active app mode and one in-flight slot per
//! operation kind. Session state sits behind a `std::sync::Mutex` that is
//! only ever held between suspension points, never across an `.await`.
//!
//! Every solve/debug path ends in a notification plus a state transition;
//! strategy errors never propagate past `run()`.

use crate::auth::{KeychainTokenStore, TokenStore};
use crate::capture::{CaptureError, CaptureProvider, SystemCapture};
use crate::mode::AppMode;
use crate::notify::{Notifier, ProcessingEvent};
use crate::queue::{QueueError, QueueKind, ScreenshotQueues, ScreenshotRef};
use crate::settings::{OverlapPolicy, Settings};
use crate::solver::{
    auth_headers, cancel_pair, CancelHandle, CancelSignal, DebugResponse, ProcessingError,
    RequestHeaders, SolveRequest, SolveResponse, SolveStrategy, SolverClient, StrategyRegistry,
};
use crate::view::{ViewMachine, ViewState};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

/// The two network operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationKind {
    Solve,
    Debug,
}

impl OperationKind {
    /// The operation a single "process" key means in `view`: solve from the
    /// queue view, debug once a solution is showing.
    pub fn for_view(view: ViewState) -> Self {
        match view {
            ViewState::Queue => OperationKind::Solve,
            ViewState::Solutions => OperationKind::Debug,
        }
    }
}

/// How a `solve()`/`debug()` call ended, from the caller's side.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Solved(SolveResponse),
    Debugged(DebugResponse),
    Failed(ProcessingError),
    Canceled,
    /// Nothing to send; `no-screenshots` was emitted.
    NoScreenshots,
    /// Another run of this kind was in flight (`OverlapPolicy::Reject`).
    Rejected,
    /// A newer run of this kind replaced this one (`OverlapPolicy::LastWins`).
    Superseded,
}

/// Point-in-time view of the session, handed to observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub mode: AppMode,
    pub view: ViewState,
    pub debug_overlay: bool,
    pub primary_len: usize,
    pub extra_len: usize,
    pub solving: bool,
    pub debugging: bool,
}

/// Notified after every session mutation, outside the session lock.
pub trait SessionObserver: Send + Sync {
    fn session_changed(&self, snapshot: &SessionSnapshot);
}

/// A queued screenshot with an inline thumbnail for the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScreenshotPreview {
    pub path: PathBuf,
    pub preview: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureFailure {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Queue(#[from] QueueError),
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Failed to open screenshot queues: {0}")]
    Queue(#[from] QueueError),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] ProcessingError),
}

/// Per-request parameters taken from settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOptions {
    pub language: String,
    pub locale: String,
    pub is_mock: bool,
    pub self_hosted: bool,
}

impl From<&Settings> for RequestOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            language: settings.language.clone(),
            locale: settings.locale.clone(),
            is_mock: settings.is_mock,
            self_hosted: settings.self_hosted,
        }
    }
}

struct InFlight {
    id: u64,
    cancel: CancelHandle,
    done: watch::Receiver<Option<RunOutcome>>,
}

#[derive(Default)]
struct InFlightSlots {
    solve: Option<InFlight>,
    debug: Option<InFlight>,
}

impl InFlightSlots {
    fn slot_mut(&mut self, kind: OperationKind) -> &mut Option<InFlight> {
        match kind {
            OperationKind::Solve => &mut self.solve,
            OperationKind::Debug => &mut self.debug,
        }
    }

    /// Cancel and clear both slots. True if anything was running.
    fn cancel_all(&mut self) -> bool {
        let mut any = false;
        for slot in [&mut self.solve, &mut self.debug] {
            if let Some(flight) = slot.take() {
                log::info!("[PIPELINE] Canceling run #{}", flight.id);
                flight.cancel.cancel();
                any = true;
            }
        }
        any
    }
}

struct Session {
    queues: ScreenshotQueues,
    view: ViewMachine,
    mode: AppMode,
    options: RequestOptions,
    policy: OverlapPolicy,
    in_flight: InFlightSlots,
    solution: Option<SolveResponse>,
    debug_result: Option<DebugResponse>,
    has_debugged: bool,
}

impl Session {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            mode: self.mode,
            view: self.view.view(),
            debug_overlay: self.view.debug_overlay(),
            primary_len: self.queues.len(QueueKind::Primary),
            extra_len: self.queues.len(QueueKind::Extra),
            solving: self.in_flight.solve.is_some(),
            debugging: self.in_flight.debug.is_some(),
        }
    }

    fn reset_all(&mut self) {
        self.in_flight.cancel_all();
        self.queues.clear_all();
        self.view.reset();
        self.solution = None;
        self.debug_result = None;
        self.has_debugged = false;
    }

    fn solve_succeeded(&mut self, response: SolveResponse) -> Vec<ProcessingEvent> {
        self.queues.clear(QueueKind::Extra);
        self.solution = Some(response.clone());
        self.view.solve_succeeded();
        vec![ProcessingEvent::SolveSuccess(response)]
    }

    fn debug_succeeded(&mut self, response: DebugResponse) -> Vec<ProcessingEvent> {
        self.debug_result = Some(response.clone());
        self.has_debugged = true;
        self.view.debug_finished();
        vec![ProcessingEvent::DebugSuccess(response)]
    }

    fn failed(&mut self, kind: OperationKind, error: &ProcessingError) -> Vec<ProcessingEvent> {
        let message = error.user_message();
        match kind {
            OperationKind::Solve => {
                self.view.solve_failed();
                vec![ProcessingEvent::SolveError(message)]
            }
            // A debug the service itself gave up on is not recoverable:
            // start the session over.
            OperationKind::Debug if error.is_remote_timeout() => {
                log::warn!("[PIPELINE] Debug timed out remotely, resetting session");
                self.reset_all();
                vec![ProcessingEvent::DebugError(message), ProcessingEvent::ResetView]
            }
            OperationKind::Debug => {
                self.view.debug_finished();
                vec![ProcessingEvent::DebugError(message)]
            }
        }
    }
}

enum Admission {
    Start(RunPlan),
    Join(watch::Receiver<Option<RunOutcome>>),
    Refuse(RunOutcome),
}

struct RunPlan {
    id: u64,
    kind: OperationKind,
    paths: Vec<PathBuf>,
    strategy: Arc<dyn SolveStrategy>,
    options: RequestOptions,
    signal: CancelSignal,
    done: watch::Sender<Option<RunOutcome>>,
}

/// Clears the in-flight slot if a run's future is dropped before it finishes.
struct RunGuard<'a> {
    orchestrator: &'a Orchestrator,
    kind: OperationKind,
    id: u64,
    armed: bool,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.orchestrator.abandon(self.kind, self.id);
        }
    }
}

pub struct Orchestrator {
    session: Mutex<Session>,
    strategies: StrategyRegistry,
    capture: Arc<dyn CaptureProvider>,
    tokens: Arc<dyn TokenStore>,
    notifier: Arc<dyn Notifier>,
    observer: Mutex<Option<Arc<dyn SessionObserver>>>,
    /// Held from snapshot to delivery so observers see changes in order.
    publish_order: Mutex<()>,
    next_run_id: AtomicU64,
}

impl Orchestrator {
    pub fn new(
        settings: &Settings,
        strategies: StrategyRegistry,
        capture: Arc<dyn CaptureProvider>,
        tokens: Arc<dyn TokenStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, QueueError> {
        let queues = ScreenshotQueues::open(
            &settings.resolved_screenshot_dir(),
            settings.extra_capacity(),
        )?;
        log::info!(
            "[PIPELINE] Session ready: mode={}, policy={:?}, self_hosted={}, mock={}",
            settings.app_mode,
            settings.overlap_policy,
            settings.self_hosted,
            settings.is_mock
        );

        Ok(Self {
            session: Mutex::new(Session {
                queues,
                view: ViewMachine::new(),
                mode: settings.app_mode,
                options: RequestOptions::from(settings),
                policy: settings.overlap_policy,
                in_flight: InFlightSlots::default(),
                solution: None,
                debug_result: None,
                has_debugged: false,
            }),
            strategies,
            capture,
            tokens,
            notifier,
            observer: Mutex::new(None),
            publish_order: Mutex::new(()),
            next_run_id: AtomicU64::new(1),
        })
    }

    /// Production wiring: HTTP strategies, OS capture tools, keychain tokens.
    pub fn with_system_defaults(
        settings: &Settings,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, StartupError> {
        let client = SolverClient::new(&settings.api_base_url, settings.request_timeout())?;
        let orchestrator = Self::new(
            settings,
            StrategyRegistry::with_defaults(client),
            Arc::new(SystemCapture::new()),
            Arc::new(KeychainTokenStore::new()),
            notifier,
        )?;
        Ok(orchestrator)
    }

    pub fn set_observer(&self, observer: Arc<dyn SessionObserver>) {
        *self.observer.lock().unwrap_or_else(|e| e.into_inner()) = Some(observer);
        self.publish();
    }

    // ── Queries ─────────────────────────────────────────────────────

    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock().snapshot()
    }

    pub fn view(&self) -> ViewState {
        self.lock().view.view()
    }

    pub fn mode(&self) -> AppMode {
        self.lock().mode
    }

    pub fn solution(&self) -> Option<SolveResponse> {
        self.lock().solution.clone()
    }

    pub fn debug_result(&self) -> Option<DebugResponse> {
        self.lock().debug_result.clone()
    }

    pub fn has_debugged(&self) -> bool {
        self.lock().has_debugged
    }

    pub fn screenshots(&self, kind: QueueKind) -> Vec<ScreenshotRef> {
        self.lock().queues.list(kind)
    }

    /// Screenshots of `kind` with base64 data-URL thumbnails. Files that
    /// cannot be read are skipped.
    pub async fn previews(&self, kind: QueueKind) -> Vec<ScreenshotPreview> {
        let shots = self.screenshots(kind);
        let mut previews = Vec::with_capacity(shots.len());
        for shot in shots {
            match tokio::fs::read(&shot.path).await {
                Ok(bytes) => previews.push(ScreenshotPreview {
                    preview: format!("data:image/png;base64,{}", encode_base64(&bytes)),
                    path: shot.path,
                }),
                Err(e) => log::warn!("[QUEUE] No preview for {}: {}", shot.path.display(), e),
            }
        }
        previews
    }

    // ── Settings that apply to later requests ───────────────────────

    /// Switch app mode. A run already in flight keeps the strategy it started with.
    pub fn set_app_mode(&self, mode: AppMode) {
        {
            let mut session = self.lock();
            if session.mode == mode {
                return;
            }
            log::info!("[PIPELINE] App mode {} -> {}", session.mode, mode);
            session.mode = mode;
        }
        self.publish();
    }

    pub fn set_language(&self, language: &str) {
        self.lock().options.language = language.to_string();
        log::info!("[PIPELINE] Language set to {}", language);
    }

    pub fn set_locale(&self, locale: &str) {
        self.lock().options.locale = locale.to_string();
    }

    pub fn set_overlap_policy(&self, policy: OverlapPolicy) {
        self.lock().policy = policy;
    }

    // ── Queue operations ────────────────────────────────────────────

    /// Grab the screen and enqueue it on the queue for the current view
    /// (primary in `queue`, extra in `solutions`), evicting if full.
    pub async fn capture(&self) -> Result<ScreenshotRef, CaptureFailure> {
        let bytes = self.capture.capture().await?;

        let (kind, path) = {
            let mut session = self.lock();
            let kind = session.view.view().capture_target();
            (kind, session.queues.next_path(kind))
        };

        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|source| QueueError::Io {
                path: path.clone(),
                source,
            })?;

        let evicted = self.lock().queues.enqueue(kind, path.clone());
        if evicted.iter().any(|old| old.path == path) {
            self.publish();
            return Err(QueueError::EvictedOnArrival(path).into());
        }
        log::info!(
            "[QUEUE] Added {} to {:?} queue ({} evicted)",
            path.display(),
            kind,
            evicted.len()
        );
        self.publish();
        Ok(ScreenshotRef { path })
    }

    /// Remove a screenshot from its queue and delete the file.
    pub fn delete_screenshot(&self, path: &Path) -> Result<(), QueueError> {
        let result = self.lock().queues.delete(path).map(|_| ());
        // Memory may have changed even when the disk delete failed.
        if !matches!(result, Err(QueueError::NotFound(_))) {
            self.publish();
        }
        result
    }

    // ── Processing ──────────────────────────────────────────────────

    /// Send the primary queue for a fresh solution.
    pub async fn solve(&self) -> RunOutcome {
        self.run(OperationKind::Solve).await
    }

    /// Send primary + extra screenshots for a revised solution.
    /// Requires at least one extra screenshot.
    pub async fn debug(&self) -> RunOutcome {
        self.run(OperationKind::Debug).await
    }

    pub async fn run(&self, kind: OperationKind) -> RunOutcome {
        let plan = match self.admit(kind) {
            Admission::Start(plan) => plan,
            Admission::Join(done) => return join(done).await,
            Admission::Refuse(outcome) => {
                if outcome == RunOutcome::NoScreenshots {
                    self.notifier.notify(ProcessingEvent::NoScreenshots);
                }
                return outcome;
            }
        };

        log::info!(
            "[PIPELINE] Run #{} {:?} dispatched with {} screenshot(s) via {}",
            plan.id,
            kind,
            plan.paths.len(),
            plan.strategy.mode()
        );
        self.notifier.notify(match kind {
            OperationKind::Solve => ProcessingEvent::SolveStart,
            OperationKind::Debug => ProcessingEvent::DebugStart,
        });
        self.publish();

        let mut guard = RunGuard {
            orchestrator: self,
            kind,
            id: plan.id,
            armed: true,
        };
        let start = std::time::Instant::now();
        let result = self.execute(&plan).await;
        guard.armed = false;

        let outcome = self.finish(kind, plan.id, result);
        log::info!(
            "[PIPELINE] Run #{} {:?} finished in {}ms: {}",
            plan.id,
            kind,
            start.elapsed().as_millis(),
            describe(&outcome)
        );
        plan.done.send_replace(Some(outcome.clone()));
        outcome
    }

    /// Abort every in-flight request. Emits `no-screenshots` only if
    /// something was actually running.
    pub fn cancel_ongoing(&self) -> bool {
        let cancelled = {
            let mut session = self.lock();
            session.has_debugged = false;
            session.in_flight.cancel_all()
        };
        if cancelled {
            self.notifier.notify(ProcessingEvent::NoScreenshots);
            self.publish();
        }
        cancelled
    }

    /// Cancel everything, empty both queues, return to the queue view.
    pub fn reset(&self) {
        self.lock().reset_all();
        log::info!("[PIPELINE] Session reset");
        self.notifier.notify(ProcessingEvent::ResetView);
        self.publish();
    }

    // ── Internals ───────────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self) {
        let _order = self.publish_order.lock().unwrap_or_else(|e| e.into_inner());
        let observer = self
            .observer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        if let Some(observer) = observer {
            let snapshot = self.snapshot();
            observer.session_changed(&snapshot);
        }
    }

    /// Decide whether a run may start, and if so claim its slot and move
    /// the view, all before the first suspension point.
    fn admit(&self, kind: OperationKind) -> Admission {
        let mut session = self.lock();

        let paths: Vec<PathBuf> = match kind {
            OperationKind::Solve => session.queues.list(QueueKind::Primary),
            OperationKind::Debug if session.queues.is_empty(QueueKind::Extra) => Vec::new(),
            OperationKind::Debug => session.queues.combined(),
        }
        .into_iter()
        .map(|shot| shot.path)
        .collect();

        if paths.is_empty() {
            log::info!("[PIPELINE] {:?} requested with nothing queued", kind);
            return Admission::Refuse(RunOutcome::NoScreenshots);
        }

        let policy = session.policy;
        let slot = session.in_flight.slot_mut(kind);
        if let Some(existing) = slot.as_ref() {
            match policy {
                OverlapPolicy::Reject => {
                    log::warn!(
                        "[PIPELINE] {:?} rejected, run #{} still in flight",
                        kind,
                        existing.id
                    );
                    return Admission::Refuse(RunOutcome::Rejected);
                }
                OverlapPolicy::Coalesce => {
                    log::info!("[PIPELINE] {:?} joins run #{}", kind, existing.id);
                    return Admission::Join(existing.done.clone());
                }
                // The old run finds a different id in the slot and ends silently.
                OverlapPolicy::LastWins => {
                    log::info!("[PIPELINE] {:?} supersedes run #{}", kind, existing.id);
                    existing.cancel.cancel();
                }
            }
        }

        let id = self.next_run_id.fetch_add(1, Ordering::Relaxed);
        let (cancel, signal) = cancel_pair();
        let (done_tx, done_rx) = watch::channel(None);
        *slot = Some(InFlight {
            id,
            cancel,
            done: done_rx,
        });

        match kind {
            OperationKind::Solve => session.view.solve_dispatched(),
            OperationKind::Debug => session.view.debug_dispatched(),
        }

        Admission::Start(RunPlan {
            id,
            kind,
            paths,
            strategy: self.strategies.resolve(session.mode),
            options: session.options.clone(),
            signal,
            done: done_tx,
        })
    }

    async fn execute(&self, plan: &RunPlan) -> Result<SolveResponse, ProcessingError> {
        let images = encode_images(&plan.paths).await?;
        let headers = self.headers(&plan.options)?;
        let request = SolveRequest {
            images,
            language: plan.options.language.clone(),
            locale: plan.options.locale.clone(),
            is_mock: plan.options.is_mock,
        };

        match plan.kind {
            OperationKind::Solve => {
                plan.strategy
                    .solve(&request, &headers, plan.signal.clone())
                    .await
            }
            OperationKind::Debug => {
                plan.strategy
                    .debug(&request, &headers, plan.signal.clone())
                    .await
            }
        }
    }

    fn headers(&self, options: &RequestOptions) -> Result<RequestHeaders, ProcessingError> {
        if options.self_hosted {
            return Ok(RequestHeaders::new());
        }
        match self.tokens.token() {
            Some(token) => Ok(auth_headers(Some(&token))),
            None => Err(ProcessingError::Unauthorized(
                "no token available".to_string(),
            )),
        }
    }

    /// Release the slot and apply the result, unless a newer run owns the
    /// slot, in which case this one finishes silently.
    fn finish(
        &self,
        kind: OperationKind,
        id: u64,
        result: Result<SolveResponse, ProcessingError>,
    ) -> RunOutcome {
        let (outcome, events) = {
            let mut session = self.lock();
            let slot = session.in_flight.slot_mut(kind);
            let owner = slot.as_ref().map(|flight| flight.id);

            match owner {
                Some(current) if current != id => (RunOutcome::Superseded, Vec::new()),
                // Slot already cleared by cancel_ongoing()/reset(): canceled,
                // whatever the network said.
                None => {
                    let events = session.failed(kind, &ProcessingError::Canceled);
                    (RunOutcome::Canceled, events)
                }
                Some(_) => {
                    *slot = None;
                    match (kind, result) {
                        (OperationKind::Solve, Ok(response)) => {
                            let events = session.solve_succeeded(response.clone());
                            (RunOutcome::Solved(response), events)
                        }
                        (OperationKind::Debug, Ok(response)) => {
                            let events = session.debug_succeeded(response.clone());
                            (RunOutcome::Debugged(response), events)
                        }
                        (_, Err(ProcessingError::Canceled)) => {
                            let events = session.failed(kind, &ProcessingError::Canceled);
                            (RunOutcome::Canceled, events)
                        }
                        (_, Err(error)) => {
                            log::error!("[PIPELINE] Run #{} {:?} failed: {}", id, kind, error);
                            let events = session.failed(kind, &error);
                            (RunOutcome::Failed(error), events)
                        }
                    }
                }
            }
        };

        for event in events {
            self.notifier.notify(event);
        }
        self.publish();
        outcome
    }

    /// A run's future was dropped mid-flight: free its slot and tell the UI.
    fn abandon(&self, kind: OperationKind, id: u64) {
        let events = {
            let mut session = self.lock();
            let slot = session.in_flight.slot_mut(kind);
            if slot.as_ref().map(|flight| flight.id) == Some(id) {
                log::warn!("[PIPELINE] Run #{} {:?} abandoned", id, kind);
                *slot = None;
                session.failed(kind, &ProcessingError::Canceled)
            } else {
                Vec::new()
            }
        };
        for event in events {
            self.notifier.notify(event);
        }
        self.publish();
    }
}

async fn join(mut done: watch::Receiver<Option<RunOutcome>>) -> RunOutcome {
    match done.wait_for(Option::is_some).await {
        Ok(outcome) => outcome.clone().unwrap_or(RunOutcome::Canceled),
        Err(_) => RunOutcome::Canceled,
    }
}

async fn encode_images(paths: &[PathBuf]) -> Result<Vec<String>, ProcessingError> {
    let mut images = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ProcessingError::Io(format!("{}: {}", path.display(), e)))?;
        images.push(encode_base64(&bytes));
    }
    Ok(images)
}

fn encode_base64(bytes: &[u8]) -> String {
    base64::Engine::encode(&base64::engine::general_purpose::STANDARD, bytes)
}

fn describe(outcome: &RunOutcome) -> String {
    match outcome {
        RunOutcome::Solved(_) => "solved".to_string(),
        RunOutcome::Debugged(_) => "debugged".to_string(),
        RunOutcome::Failed(e) => format!("failed ({})", e),
        RunOutcome::Canceled => "canceled".to_string(),
        RunOutcome::NoScreenshots => "no screenshots".to_string(),
        RunOutcome::Rejected => "rejected".to_string(),
        RunOutcome::Superseded => "superseded".to_string(),
    }
}

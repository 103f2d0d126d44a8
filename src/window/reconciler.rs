//! Keeps the native window's attributes in line with `(mode, phase)`.
//!
//! The phase is derived from window visibility plus the session's view and
//! primary-queue emptiness. Native calls are made after the state lock is
//! released: on some platforms they round-trip through the UI thread.
//!
//! Only one thread writes to the window at a time. A caller that arrives
//! mid-write records its change and returns; the thread already writing
//! re-plans from the latest state before it lets go, so the last write to
//! land always matches the current `(mode, phase)`.

use super::{apply, NativeWindow, Phase, VisibilityTable, WindowError, WindowVisibilityConfig};
use crate::mode::AppMode;
use crate::pipeline::{SessionObserver, SessionSnapshot};
use crate::view::ViewState;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Toggles closer together than this are key-repeat noise.
pub const TOGGLE_DEBOUNCE: Duration = Duration::from_millis(300);

struct ReconcilerState {
    visible: bool,
    mode: AppMode,
    view: ViewState,
    queue_empty: bool,
    table: VisibilityTable,
    last_applied: Option<(AppMode, Phase)>,
    last_toggle: Option<Instant>,
    writing: bool,
    /// A change arrived mid-write. `Some(true)` if any of them forced.
    pending: Option<bool>,
}

impl ReconcilerState {
    fn phase(&self) -> Phase {
        if !self.visible {
            Phase::Hide
        } else if self.view == ViewState::Queue {
            if self.queue_empty {
                Phase::QueueEmpty
            } else {
                Phase::QueueNonEmpty
            }
        } else {
            Phase::Show
        }
    }

    /// The config to push now, or `None` when nothing changed and the
    /// caller did not force a write.
    fn plan(&mut self, force: bool) -> Option<(Phase, WindowVisibilityConfig)> {
        let phase = self.phase();
        let key = (self.mode, phase);
        if !force && self.last_applied == Some(key) {
            return None;
        }
        self.last_applied = Some(key);
        Some((phase, self.table.get(phase)))
    }

    /// Claim the writer role for a plan, or park the request for the
    /// thread that already holds it.
    fn schedule(&mut self, force: bool) -> Option<(Phase, WindowVisibilityConfig)> {
        if self.writing {
            self.pending = Some(self.pending.unwrap_or(false) || force);
            return None;
        }
        let plan = self.plan(force)?;
        self.writing = true;
        Some(plan)
    }
}

pub struct WindowReconciler<W: NativeWindow> {
    window: W,
    state: Mutex<ReconcilerState>,
}

impl<W: NativeWindow> WindowReconciler<W> {
    /// Starts visible, in the queue view, with nothing queued. Nothing is
    /// written until the first `show()`/`sync()`.
    pub fn new(window: W, mode: AppMode) -> Self {
        Self {
            window,
            state: Mutex::new(ReconcilerState {
                visible: true,
                mode,
                view: ViewState::Queue,
                queue_empty: true,
                table: VisibilityTable::for_mode(mode),
                last_applied: None,
                last_toggle: None,
                writing: false,
                pending: None,
            }),
        }
    }

    pub fn window(&self) -> &W {
        &self.window
    }

    pub fn phase(&self) -> Phase {
        self.lock().phase()
    }

    pub fn is_visible(&self) -> bool {
        self.lock().visible
    }

    pub fn show(&self) -> Result<(), WindowError> {
        let plan = {
            let mut state = self.lock();
            state.visible = true;
            state.schedule(true)
        };
        self.write(plan)
    }

    pub fn hide(&self) -> Result<(), WindowError> {
        let plan = {
            let mut state = self.lock();
            state.visible = false;
            state.schedule(true)
        };
        self.write(plan)
    }

    /// Flip show/hide. Returns `false` when swallowed by the debounce.
    pub fn toggle(&self) -> Result<bool, WindowError> {
        self.toggle_at(Instant::now())
    }

    pub fn toggle_at(&self, now: Instant) -> Result<bool, WindowError> {
        let plan = {
            let mut state = self.lock();
            if let Some(last) = state.last_toggle {
                if now.saturating_duration_since(last) < TOGGLE_DEBOUNCE {
                    log::debug!("[WINDOW] Toggle ignored (debounce)");
                    return Ok(false);
                }
            }
            state.last_toggle = Some(now);
            state.visible = !state.visible;
            state.schedule(true)
        };
        self.write(plan)?;
        Ok(true)
    }

    /// Window regained focus. The OS may have reset taskbar or stacking
    /// state behind our back, so write everything again.
    pub fn on_focus(&self) -> Result<(), WindowError> {
        let plan = self.lock().schedule(true);
        self.write(plan)
    }

    pub fn set_mode(&self, mode: AppMode) -> Result<(), WindowError> {
        let plan = {
            let mut state = self.lock();
            state.mode = mode;
            state.table = VisibilityTable::for_mode(mode);
            state.schedule(true)
        };
        self.write(plan)
    }

    /// Pick up queue/view/mode from the session. Writes only if
    /// `(mode, phase)` moved, except that a mode change always rewrites.
    pub fn sync(&self, snapshot: &SessionSnapshot) -> Result<(), WindowError> {
        let plan = {
            let mut state = self.lock();
            let mode_changed = state.mode != snapshot.mode;
            if mode_changed {
                state.mode = snapshot.mode;
                state.table = VisibilityTable::for_mode(snapshot.mode);
            }
            state.view = snapshot.view;
            state.queue_empty = snapshot.primary_len == 0;
            state.schedule(mode_changed)
        };
        self.write(plan)
    }

    fn lock(&self) -> MutexGuard<'_, ReconcilerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Push a claimed plan, then drain whatever piled up meanwhile.
    /// `None` means either nothing to do or another thread is writing.
    fn write(&self, plan: Option<(Phase, WindowVisibilityConfig)>) -> Result<(), WindowError> {
        let Some(mut next) = plan else {
            return Ok(());
        };
        let mut result = Ok(());
        loop {
            let (phase, config) = next;
            log::debug!("[WINDOW] Applying {:?} (opacity {})", phase, config.opacity);
            if let Err(e) = apply(&self.window, &config) {
                result = Err(e);
            }

            let mut state = self.lock();
            let replan = match state.pending.take() {
                Some(force) => state.plan(force),
                None => None,
            };
            match replan {
                Some(plan) => next = plan,
                None => {
                    state.writing = false;
                    return result;
                }
            }
        }
    }
}

impl<W: NativeWindow> SessionObserver for WindowReconciler<W> {
    fn session_changed(&self, snapshot: &SessionSnapshot) {
        if let Err(e) = self.sync(snapshot) {
            log::warn!("[WINDOW] Failed to reconcile visibility: {}", e);
        }
    }
}

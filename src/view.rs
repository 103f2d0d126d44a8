//! View state machine.
//!
//! queue → solutions on solve dispatch, back to queue on solve failure or
//! reset. Debug is an overlay flag on top of `solutions`, not a state.

use serde::{Deserialize, Serialize};

use crate::queue::QueueKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ViewState {
    Queue,
    Solutions,
}

impl ViewState {
    /// Queue that a capture taken in this view lands in.
    pub fn capture_target(self) -> QueueKind {
        match self {
            ViewState::Queue => QueueKind::Primary,
            ViewState::Solutions => QueueKind::Extra,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewMachine {
    view: ViewState,
    debug_overlay: bool,
}

impl ViewMachine {
    pub fn new() -> Self {
        Self {
            view: ViewState::Queue,
            debug_overlay: false,
        }
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn debug_overlay(&self) -> bool {
        self.debug_overlay
    }

    pub fn solve_dispatched(&mut self) {
        self.go(ViewState::Solutions, "solve dispatched");
    }

    /// A solve completed; the view stays (or lands) on solutions.
    pub fn solve_succeeded(&mut self) {
        self.go(ViewState::Solutions, "solve succeeded");
    }

    /// Failure or cancellation of a solve. Queues are not touched here.
    pub fn solve_failed(&mut self) {
        self.go(ViewState::Queue, "solve failed");
    }

    pub fn debug_dispatched(&mut self) {
        self.debug_overlay = true;
    }

    pub fn debug_finished(&mut self) {
        self.debug_overlay = false;
    }

    pub fn reset(&mut self) {
        self.debug_overlay = false;
        self.go(ViewState::Queue, "reset");
    }

    fn go(&mut self, to: ViewState, trigger: &str) {
        if self.view != to {
            log::info!("[VIEW] {:?} -> {:?} ({})", self.view, to, trigger);
        }
        self.view = to;
    }
}

impl Default for ViewMachine {
    fn default() -> Self {
        Self::new()
    }
}

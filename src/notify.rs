//! Notification channel to the UI.
//!
//! Fire-and-forget: the orchestrator never waits for, or depends on, a
//! listener. Event names are the wire names the renderer subscribes to.

use crate::solver::{DebugResponse, SolveResponse};
use serde::Serialize;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum ProcessingEvent {
    SolveStart,
    SolveSuccess(SolveResponse),
    SolveError(String),
    DebugStart,
    DebugSuccess(DebugResponse),
    DebugError(String),
    NoScreenshots,
    ResetView,
}

impl ProcessingEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            ProcessingEvent::SolveStart => "solve-start",
            ProcessingEvent::SolveSuccess(_) => "solve-success",
            ProcessingEvent::SolveError(_) => "solve-error",
            ProcessingEvent::DebugStart => "debug-start",
            ProcessingEvent::DebugSuccess(_) => "debug-success",
            ProcessingEvent::DebugError(_) => "debug-error",
            ProcessingEvent::NoScreenshots => "no-screenshots",
            ProcessingEvent::ResetView => "reset-view",
        }
    }

    /// Event body, `null` for bare signals.
    pub fn payload(&self) -> serde_json::Value {
        match self {
            ProcessingEvent::SolveSuccess(data) | ProcessingEvent::DebugSuccess(data) => {
                serde_json::to_value(data).unwrap_or(serde_json::Value::Null)
            }
            ProcessingEvent::SolveError(msg) | ProcessingEvent::DebugError(msg) => {
                serde_json::Value::String(msg.clone())
            }
            _ => serde_json::Value::Null,
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, event: ProcessingEvent);
}

/// Keeps every event in memory, in order.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<ProcessingEvent>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProcessingEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn take(&self) -> Vec<ProcessingEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, event: ProcessingEvent) {
        log::debug!("[NOTIFY] {}", event.name());
        self.events.lock().unwrap_or_else(|e| e.into_inner()).push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_are_kebab_case() {
        assert_eq!(ProcessingEvent::NoScreenshots.name(), "no-screenshots");
        let json = serde_json::to_value(ProcessingEvent::DebugError("x".to_string())).unwrap();
        assert_eq!(json["event"], "debug-error");
        assert_eq!(json["payload"], "x");
    }

    #[test]
    fn payload_is_null_for_signals() {
        assert!(ProcessingEvent::ResetView.payload().is_null());
        assert_eq!(
            ProcessingEvent::SolveError("boom".to_string()).payload(),
            serde_json::Value::String("boom".to_string())
        );
    }
}

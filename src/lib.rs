//! coder-overlay: capture a coding problem, get a solution back, in an
//! overlay that screen sharing does not see.
//!
//! The core (everything except `desktop`) is GUI-free and drives the whole
//! capture → queue → solve/debug → view flow against traits:
//!   - capture:   OS screenshot tools behind `CaptureProvider`
//!   - queue:     primary/extra screenshot queues on disk
//!   - view:      queue/solutions view state + debug overlay
//!   - solver:    per-mode HTTP request strategies, error taxonomy, cancellation
//!   - pipeline:  the orchestrator that owns the session
//!   - window:    visibility tables and the reconciler
//!   - notify:    events to the UI
//!   - auth:      bearer token lookup
//!   - settings:  settings.json + env overrides
//!
//! The `desktop` feature adds the Tauri shell around it.

pub mod auth;
pub mod capture;
pub mod mode;
pub mod notify;
pub mod pipeline;
pub mod queue;
pub mod settings;
pub mod solver;
pub mod view;
pub mod window;

#[cfg(feature = "desktop")]
mod desktop;

#[cfg(feature = "desktop")]
pub use desktop::run;

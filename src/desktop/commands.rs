//! Tauri command handlers the renderer invokes.
//!
//! Thin wrappers over `Orchestrator` and the window reconciler. Solve and
//! debug are fire-and-forget: results arrive as events, not return values.

use super::Reconciler;
use crate::mode::AppMode;
use crate::pipeline::{
    CaptureFailure, OperationKind, Orchestrator, ScreenshotPreview, SessionSnapshot,
};
use crate::queue::{QueueKind, ScreenshotRef};
use crate::settings::Settings;
use crate::solver::{DebugResponse, SolveResponse};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tauri::State;

/// Time for the compositor to drop the overlay before the screen is grabbed.
const HIDE_SETTLE: Duration = Duration::from_millis(100);

/// Capture with the overlay out of the frame, restoring it afterwards.
pub(super) async fn capture_hidden(
    orchestrator: &Orchestrator,
    reconciler: &Reconciler,
) -> Result<ScreenshotRef, CaptureFailure> {
    let was_visible = reconciler.is_visible();
    if was_visible {
        if let Err(e) = reconciler.hide() {
            log::warn!("[CAPTURE] Could not hide overlay: {}", e);
        }
        tokio::time::sleep(HIDE_SETTLE).await;
    }

    let result = orchestrator.capture().await;

    if was_visible {
        if let Err(e) = reconciler.show() {
            log::warn!("[CAPTURE] Could not restore overlay: {}", e);
        }
    }
    result
}

/// Run solve/debug in the background; the outcome is reported via events.
pub(super) fn spawn_run(orchestrator: Arc<Orchestrator>, kind: OperationKind) {
    tauri::async_runtime::spawn(async move {
        orchestrator.run(kind).await;
    });
}

/// Persist one settings change. Failures are logged, not surfaced.
fn persist(update: impl FnOnce(&mut Settings)) {
    let path = match Settings::settings_path() {
        Some(path) => path,
        None => return,
    };
    let mut settings = Settings::load_from(&path);
    update(&mut settings);
    if let Err(e) = settings.save_to(&path) {
        log::warn!("[SETTINGS] {}", e);
    }
}

#[tauri::command]
pub async fn take_screenshot(
    orchestrator: State<'_, Arc<Orchestrator>>,
    reconciler: State<'_, Arc<Reconciler>>,
) -> Result<ScreenshotRef, String> {
    capture_hidden(&orchestrator, &reconciler)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn get_screenshots(
    orchestrator: State<'_, Arc<Orchestrator>>,
    kind: QueueKind,
) -> Result<Vec<ScreenshotPreview>, String> {
    Ok(orchestrator.previews(kind).await)
}

#[tauri::command]
pub fn delete_screenshot(
    orchestrator: State<'_, Arc<Orchestrator>>,
    path: PathBuf,
) -> Result<(), String> {
    orchestrator
        .delete_screenshot(&path)
        .map_err(|e| e.to_string())
}

/// The single "process" key: solve from the queue view, debug otherwise.
#[tauri::command]
pub fn process_screenshots(orchestrator: State<'_, Arc<Orchestrator>>) {
    let kind = OperationKind::for_view(orchestrator.view());
    spawn_run(orchestrator.inner().clone(), kind);
}

#[tauri::command]
pub fn solve(orchestrator: State<'_, Arc<Orchestrator>>) {
    spawn_run(orchestrator.inner().clone(), OperationKind::Solve);
}

#[tauri::command]
pub fn debug(orchestrator: State<'_, Arc<Orchestrator>>) {
    spawn_run(orchestrator.inner().clone(), OperationKind::Debug);
}

#[tauri::command]
pub fn cancel_processing(orchestrator: State<'_, Arc<Orchestrator>>) -> bool {
    orchestrator.cancel_ongoing()
}

#[tauri::command]
pub fn reset_session(orchestrator: State<'_, Arc<Orchestrator>>) {
    orchestrator.reset();
}

#[tauri::command]
pub fn toggle_window(reconciler: State<'_, Arc<Reconciler>>) -> Result<bool, String> {
    reconciler.toggle().map_err(|e| e.to_string())
}

#[tauri::command]
pub fn get_session(orchestrator: State<'_, Arc<Orchestrator>>) -> SessionSnapshot {
    orchestrator.snapshot()
}

#[tauri::command]
pub fn get_solution(orchestrator: State<'_, Arc<Orchestrator>>) -> Option<SolveResponse> {
    orchestrator.solution()
}

#[tauri::command]
pub fn get_debug_result(orchestrator: State<'_, Arc<Orchestrator>>) -> Option<DebugResponse> {
    orchestrator.debug_result()
}

#[tauri::command]
pub fn set_language(orchestrator: State<'_, Arc<Orchestrator>>, language: String) {
    orchestrator.set_language(&language);
    persist(|s| s.language = language);
}

#[tauri::command]
pub fn set_app_mode(orchestrator: State<'_, Arc<Orchestrator>>, mode: String) -> Result<(), String> {
    let mode = mode.parse::<AppMode>().map_err(|e| e.to_string())?;
    orchestrator.set_app_mode(mode);
    persist(|s| s.app_mode = mode);
    Ok(())
}

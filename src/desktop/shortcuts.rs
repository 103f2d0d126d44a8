//! Global hotkeys. All bindings use Cmd on macOS, Ctrl elsewhere.
//!
//!   H      capture a screenshot
//!   Enter  process (solve in the queue view, debug once solved)
//!   R      reset the session
//!   B      show/hide the overlay
//!   Q      quit

use super::commands::{capture_hidden, spawn_run};
use super::Reconciler;
use crate::pipeline::{OperationKind, Orchestrator};
use std::sync::Arc;
use tauri::{AppHandle, Manager};
use tauri_plugin_global_shortcut::{Code, GlobalShortcutExt, Modifiers, Shortcut, ShortcutState};

#[cfg(target_os = "macos")]
const PRIMARY: Modifiers = Modifiers::SUPER;
#[cfg(not(target_os = "macos"))]
const PRIMARY: Modifiers = Modifiers::CONTROL;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HotkeyAction {
    Capture,
    Process,
    Reset,
    ToggleWindow,
    Quit,
}

const BINDINGS: [(Code, HotkeyAction); 5] = [
    (Code::KeyH, HotkeyAction::Capture),
    (Code::Enter, HotkeyAction::Process),
    (Code::KeyR, HotkeyAction::Reset),
    (Code::KeyB, HotkeyAction::ToggleWindow),
    (Code::KeyQ, HotkeyAction::Quit),
];

pub fn plugin() -> tauri::plugin::TauriPlugin<tauri::Wry> {
    tauri_plugin_global_shortcut::Builder::new()
        .with_handler(|app, shortcut, event| {
            if event.state() != ShortcutState::Pressed {
                return;
            }
            if let Some(action) = action_for(shortcut) {
                log::info!("[SHORTCUT] {:?}", action);
                dispatch(app, action);
            }
        })
        .build()
}

/// Register every binding. A binding another app already owns is skipped.
pub fn register(app: &AppHandle) {
    for (code, action) in BINDINGS {
        let shortcut = Shortcut::new(Some(PRIMARY), code);
        if let Err(e) = app.global_shortcut().register(shortcut) {
            log::warn!("[SHORTCUT] Could not register {:?}: {}", action, e);
        }
    }
}

fn action_for(shortcut: &Shortcut) -> Option<HotkeyAction> {
    BINDINGS
        .iter()
        .find(|(code, _)| shortcut.matches(PRIMARY, *code))
        .map(|(_, action)| *action)
}

fn dispatch(app: &AppHandle, action: HotkeyAction) {
    let (Some(orchestrator), Some(reconciler)) = (
        app.try_state::<Arc<Orchestrator>>(),
        app.try_state::<Arc<Reconciler>>(),
    ) else {
        log::warn!("[SHORTCUT] {:?} pressed before setup finished", action);
        return;
    };
    let orchestrator = orchestrator.inner().clone();
    let reconciler = reconciler.inner().clone();

    match action {
        HotkeyAction::Capture => {
            tauri::async_runtime::spawn(async move {
                if let Err(e) = capture_hidden(&orchestrator, &reconciler).await {
                    log::error!("[CAPTURE] {}", e);
                }
            });
        }
        HotkeyAction::Process => {
            let kind = OperationKind::for_view(orchestrator.view());
            spawn_run(orchestrator, kind);
        }
        HotkeyAction::Reset => orchestrator.reset(),
        HotkeyAction::ToggleWindow => {
            if let Err(e) = reconciler.toggle() {
                log::warn!("[WINDOW] Toggle failed: {}", e);
            }
        }
        HotkeyAction::Quit => app.exit(0),
    }
}

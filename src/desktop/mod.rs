//! Native shell: the Tauri app that hosts the overlay.
//!
//! Wires the headless core to a real window: Tauri events as the
//! notification channel, a `WebviewWindow` behind `NativeWindow`, global
//! hotkeys, a tray menu, and the commands the renderer invokes.

mod commands;
mod shortcuts;
mod tray;
mod window;

pub use window::TauriWindow;

use crate::notify::{Notifier, ProcessingEvent};
use crate::pipeline::Orchestrator;
use crate::settings::{self, Settings};
use crate::window::WindowReconciler;
use std::sync::Arc;
use tauri::{AppHandle, Emitter, Manager};

pub type Reconciler = WindowReconciler<TauriWindow>;

const MAIN_WINDOW: &str = "main";

/// Forwards processing events to every webview.
pub struct TauriNotifier {
    app: AppHandle,
}

impl Notifier for TauriNotifier {
    fn notify(&self, event: ProcessingEvent) {
        log::debug!("[NOTIFY] {}", event.name());
        if let Err(e) = self.app.emit(event.name(), event.payload()) {
            log::warn!("[NOTIFY] Failed to emit {}: {}", event.name(), e);
        }
    }
}

/// Entry point, called by the Tauri runtime.
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    let manifest_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    let env_file = settings::load_dotenv(manifest_dir);

    env_logger::init();
    if let Some(path) = env_file {
        log::info!("[SETTINGS] Loaded {}", path.display());
    }

    let settings = Settings::load();

    tauri::Builder::default()
        .plugin(shortcuts::plugin())
        .invoke_handler(tauri::generate_handler![
            commands::take_screenshot,
            commands::get_screenshots,
            commands::delete_screenshot,
            commands::process_screenshots,
            commands::solve,
            commands::debug,
            commands::cancel_processing,
            commands::reset_session,
            commands::toggle_window,
            commands::get_session,
            commands::get_solution,
            commands::get_debug_result,
            commands::set_language,
            commands::set_app_mode,
        ])
        .setup(move |app| {
            log::info!(
                "coder-overlay starting up: {} mode against {}",
                settings.app_mode,
                settings.api_base_url
            );

            let window = build_main_window(app.handle())?;
            let notifier = Arc::new(TauriNotifier {
                app: app.handle().clone(),
            });
            let orchestrator = Arc::new(Orchestrator::with_system_defaults(&settings, notifier)?);
            let reconciler = Arc::new(WindowReconciler::new(
                TauriWindow::new(window.clone()),
                settings.app_mode,
            ));

            orchestrator.set_observer(reconciler.clone());
            reconciler.show()?;

            let focus_reconciler = reconciler.clone();
            window.on_window_event(move |event| {
                if let tauri::WindowEvent::Focused(true) = event {
                    if let Err(e) = focus_reconciler.on_focus() {
                        log::warn!("[WINDOW] Re-apply on focus failed: {}", e);
                    }
                }
            });

            app.manage(orchestrator);
            app.manage(reconciler);

            shortcuts::register(app.handle());
            tray::setup_tray(app.handle())?;

            log::info!("Overlay ready");
            Ok(())
        })
        .run(tauri::generate_context!())
        .expect("Error running coder-overlay");
}

fn build_main_window(app: &AppHandle) -> tauri::Result<tauri::WebviewWindow> {
    tauri::WebviewWindowBuilder::new(app, MAIN_WINDOW, tauri::WebviewUrl::App("index.html".into()))
        .title("coder-overlay")
        .inner_size(760.0, 560.0)
        .decorations(false)
        .transparent(true)
        .shadow(false)
        .always_on_top(true)
        .skip_taskbar(true)
        .content_protected(true)
        .visible_on_all_workspaces(true)
        .focused(false)
        .build()
}

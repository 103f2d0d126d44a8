//! System tray icon: a fallback for when hotkeys are taken or forgotten.
//!
//! Left-click toggles the overlay. Menu: Show/Hide, Reset, Quit.

use super::Reconciler;
use crate::pipeline::Orchestrator;
use std::sync::Arc;
use tauri::{
    image::Image as TauriImage,
    menu::{MenuBuilder, MenuItemBuilder},
    tray::TrayIconBuilder,
    AppHandle, Manager,
};

pub fn setup_tray(app: &AppHandle) -> Result<(), Box<dyn std::error::Error>> {
    let toggle_item = MenuItemBuilder::with_id("toggle", "Show / Hide").build(app)?;
    let reset_item = MenuItemBuilder::with_id("reset", "Reset Session").build(app)?;
    let quit_item = MenuItemBuilder::with_id("quit", "Quit").build(app)?;
    let menu = MenuBuilder::new(app)
        .item(&toggle_item)
        .item(&reset_item)
        .separator()
        .item(&quit_item)
        .build()?;

    // Decode the PNG icon to RGBA for Tauri's Image type
    let icon_bytes = include_bytes!("../../icons/icon.png");
    let icon_img = image::load_from_memory(icon_bytes)
        .map_err(|e| format!("Failed to decode tray icon: {}", e))?;
    let rgba = icon_img.to_rgba8();
    let (w, h) = (rgba.width(), rgba.height());
    let tray_icon = TauriImage::new_owned(rgba.into_raw(), w, h);

    let _tray = TrayIconBuilder::new()
        .icon(tray_icon)
        .tooltip("coder-overlay")
        .menu(&menu)
        .show_menu_on_left_click(false)
        .on_tray_icon_event(|tray_icon, event| {
            if let tauri::tray::TrayIconEvent::Click {
                button: tauri::tray::MouseButton::Left,
                button_state: tauri::tray::MouseButtonState::Up,
                ..
            } = event
            {
                toggle(tray_icon.app_handle());
            }
        })
        .on_menu_event(|app, event| match event.id().as_ref() {
            "toggle" => toggle(app),
            "reset" => {
                if let Some(orchestrator) = app.try_state::<Arc<Orchestrator>>() {
                    orchestrator.reset();
                }
            }
            "quit" => {
                log::info!("Quit requested from tray menu");
                app.exit(0);
            }
            _ => {}
        })
        .build(app)?;

    Ok(())
}

fn toggle(app: &AppHandle) {
    if let Some(reconciler) = app.try_state::<Arc<Reconciler>>() {
        if let Err(e) = reconciler.toggle() {
            log::warn!("[WINDOW] Toggle failed: {}", e);
        }
    }
}

//! `NativeWindow` over a Tauri webview window.
//!
//! Tauri has no per-window opacity or stacking levels: opacity goes to the
//! renderer as a `window-opacity` event (the page is transparent), and every
//! non-normal level maps to plain always-on-top.

use crate::window::{AlwaysOnTopLevel, Bounds, NativeWindow, WindowError};
use tauri::{Emitter, PhysicalPosition, PhysicalSize, WebviewWindow};

#[cfg(target_os = "macos")]
use tauri::Manager;

pub struct TauriWindow {
    window: WebviewWindow,
}

impl TauriWindow {
    pub fn new(window: WebviewWindow) -> Self {
        Self { window }
    }
}

fn native(e: tauri::Error) -> WindowError {
    WindowError::Native(e.to_string())
}

impl NativeWindow for TauriWindow {
    fn bounds(&self) -> Result<Bounds, WindowError> {
        let position = self.window.outer_position().map_err(native)?;
        let size = self.window.outer_size().map_err(native)?;
        Ok(Bounds {
            x: position.x,
            y: position.y,
            width: size.width,
            height: size.height,
        })
    }

    fn set_bounds(&self, bounds: Bounds) -> Result<(), WindowError> {
        self.window
            .set_position(PhysicalPosition::new(bounds.x, bounds.y))
            .map_err(native)?;
        self.window
            .set_size(PhysicalSize::new(bounds.width, bounds.height))
            .map_err(native)
    }

    fn set_opacity(&self, opacity: f64) -> Result<(), WindowError> {
        self.window.emit("window-opacity", opacity).map_err(native)
    }

    fn set_ignore_mouse_events(&self, ignore: bool) -> Result<(), WindowError> {
        self.window.set_ignore_cursor_events(ignore).map_err(native)
    }

    fn set_skip_taskbar(&self, skip: bool) -> Result<(), WindowError> {
        self.window.set_skip_taskbar(skip).map_err(native)
    }

    fn set_always_on_top(&self, on_top: bool, level: AlwaysOnTopLevel) -> Result<(), WindowError> {
        log::debug!("[WINDOW] always_on_top={} level={:?}", on_top, level);
        self.window.set_always_on_top(on_top).map_err(native)
    }

    fn set_visible_on_all_workspaces(
        &self,
        visible: bool,
        _on_full_screen: bool,
    ) -> Result<(), WindowError> {
        self.window
            .set_visible_on_all_workspaces(visible)
            .map_err(native)
    }

    fn set_focusable(&self, focusable: bool) -> Result<(), WindowError> {
        self.window.set_focusable(focusable).map_err(native)
    }

    fn set_content_protection(&self, enabled: bool) -> Result<(), WindowError> {
        self.window.set_content_protected(enabled).map_err(native)
    }

    #[cfg(target_os = "macos")]
    fn set_dock_visible(&self, visible: bool) -> Result<(), WindowError> {
        let policy = if visible {
            tauri::ActivationPolicy::Regular
        } else {
            tauri::ActivationPolicy::Accessory
        };
        self.window
            .app_handle()
            .set_activation_policy(policy)
            .map_err(native)
    }
}

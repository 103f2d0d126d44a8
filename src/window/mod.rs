//! Window visibility: pure config tables plus the reconciler that pushes
//! them onto a native window.

pub mod config;
pub mod reconciler;

pub use config::{compute_config, AlwaysOnTopLevel, Phase, VisibilityTable, WindowVisibilityConfig};
pub use reconciler::{WindowReconciler, TOGGLE_DEBOUNCE};

use serde::{Deserialize, Serialize};

/// Outer window position and size in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum WindowError {
    #[error("Native window call failed: {0}")]
    Native(String),
}

/// The attribute setters the reconciler needs from a platform window.
pub trait NativeWindow: Send + Sync {
    fn bounds(&self) -> Result<Bounds, WindowError>;
    fn set_bounds(&self, bounds: Bounds) -> Result<(), WindowError>;
    fn set_opacity(&self, opacity: f64) -> Result<(), WindowError>;
    fn set_ignore_mouse_events(&self, ignore: bool) -> Result<(), WindowError>;
    fn set_skip_taskbar(&self, skip: bool) -> Result<(), WindowError>;
    fn set_always_on_top(&self, on_top: bool, level: AlwaysOnTopLevel) -> Result<(), WindowError>;
    fn set_visible_on_all_workspaces(
        &self,
        visible: bool,
        on_full_screen: bool,
    ) -> Result<(), WindowError>;
    fn set_focusable(&self, focusable: bool) -> Result<(), WindowError>;
    fn set_content_protection(&self, enabled: bool) -> Result<(), WindowError>;

    /// macOS dock icon. No-op elsewhere.
    fn set_dock_visible(&self, _visible: bool) -> Result<(), WindowError> {
        Ok(())
    }
}

/// Write every attribute of `config`, then put the window back where it
/// was. Several native setters move or resize the window as a side effect,
/// so the bounds are restored even when one of the writes fails.
pub fn apply(window: &dyn NativeWindow, config: &WindowVisibilityConfig) -> Result<(), WindowError> {
    let bounds = window.bounds()?;
    let written = write_attributes(window, config);
    let restored = window.set_bounds(bounds);
    written.and(restored)
}

fn write_attributes(
    window: &dyn NativeWindow,
    config: &WindowVisibilityConfig,
) -> Result<(), WindowError> {
    window.set_content_protection(config.content_protection)?;
    window.set_skip_taskbar(config.skip_taskbar)?;
    window.set_focusable(config.focusable)?;
    window.set_always_on_top(config.always_on_top, config.always_on_top_level)?;
    window.set_visible_on_all_workspaces(
        config.visible_on_all_workspaces,
        config.visible_on_full_screen,
    )?;
    window.set_ignore_mouse_events(config.ignore_mouse_events)?;
    if let Some(hide) = config.hide_from_dock {
        window.set_dock_visible(!hide)?;
    }
    window.set_opacity(config.opacity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::AppMode;
    use std::sync::Mutex;

    const HOME: Bounds = Bounds {
        x: 12,
        y: 34,
        width: 900,
        height: 700,
    };

    /// Moves on every attribute write and refuses to change focusability.
    struct StubbornWindow {
        bounds: Mutex<Bounds>,
        opacity: Mutex<Option<f64>>,
    }

    impl StubbornWindow {
        fn new() -> Self {
            Self {
                bounds: Mutex::new(HOME),
                opacity: Mutex::new(None),
            }
        }

        fn drift(&self) {
            let mut bounds = self.bounds.lock().unwrap();
            bounds.x += 5;
            bounds.width = 100;
        }
    }

    impl NativeWindow for StubbornWindow {
        fn bounds(&self) -> Result<Bounds, WindowError> {
            Ok(*self.bounds.lock().unwrap())
        }
        fn set_bounds(&self, bounds: Bounds) -> Result<(), WindowError> {
            *self.bounds.lock().unwrap() = bounds;
            Ok(())
        }
        fn set_opacity(&self, opacity: f64) -> Result<(), WindowError> {
            *self.opacity.lock().unwrap() = Some(opacity);
            Ok(())
        }
        fn set_ignore_mouse_events(&self, _ignore: bool) -> Result<(), WindowError> {
            Ok(())
        }
        fn set_skip_taskbar(&self, _skip: bool) -> Result<(), WindowError> {
            self.drift();
            Ok(())
        }
        fn set_always_on_top(&self, _on_top: bool, _level: AlwaysOnTopLevel) -> Result<(), WindowError> {
            Ok(())
        }
        fn set_visible_on_all_workspaces(&self, _v: bool, _fs: bool) -> Result<(), WindowError> {
            Ok(())
        }
        fn set_focusable(&self, _focusable: bool) -> Result<(), WindowError> {
            self.drift();
            Err(WindowError::Native("focus change refused".to_string()))
        }
        fn set_content_protection(&self, _enabled: bool) -> Result<(), WindowError> {
            Ok(())
        }
    }

    #[test]
    fn failed_write_still_restores_bounds() {
        let window = StubbornWindow::new();
        let config = compute_config(AppMode::LiveInterview, Phase::QueueEmpty);

        let err = apply(&window, &config).unwrap_err();

        assert!(err.to_string().contains("focus change refused"));
        assert_eq!(window.bounds().unwrap(), HOME);
        assert_eq!(*window.opacity.lock().unwrap(), None, "writes stop at the failure");
    }
}

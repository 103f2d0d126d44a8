//! Reconciler wired as the orchestrator's session observer: queue, view and
//! mode changes reach the native window without any explicit call.

mod pipeline_helpers;

use coder_overlay_lib::mode::AppMode;
use coder_overlay_lib::window::{
    AlwaysOnTopLevel, Bounds, NativeWindow, Phase, WindowError, WindowReconciler,
};
use pipeline_helpers::Harness;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct LoggedWindow {
    opacity: Mutex<Vec<f64>>,
    focusable: Mutex<Option<bool>>,
}

impl LoggedWindow {
    fn last_opacity(&self) -> Option<f64> {
        self.opacity.lock().unwrap().last().copied()
    }

    fn writes(&self) -> usize {
        self.opacity.lock().unwrap().len()
    }
}

impl NativeWindow for LoggedWindow {
    fn bounds(&self) -> Result<Bounds, WindowError> {
        Ok(Bounds {
            x: 10,
            y: 10,
            width: 640,
            height: 480,
        })
    }
    fn set_bounds(&self, _bounds: Bounds) -> Result<(), WindowError> {
        Ok(())
    }
    fn set_opacity(&self, opacity: f64) -> Result<(), WindowError> {
        self.opacity.lock().unwrap().push(opacity);
        Ok(())
    }
    fn set_ignore_mouse_events(&self, _ignore: bool) -> Result<(), WindowError> {
        Ok(())
    }
    fn set_skip_taskbar(&self, _skip: bool) -> Result<(), WindowError> {
        Ok(())
    }
    fn set_always_on_top(&self, _on_top: bool, _level: AlwaysOnTopLevel) -> Result<(), WindowError> {
        Ok(())
    }
    fn set_visible_on_all_workspaces(&self, _v: bool, _fs: bool) -> Result<(), WindowError> {
        Ok(())
    }
    fn set_focusable(&self, focusable: bool) -> Result<(), WindowError> {
        *self.focusable.lock().unwrap() = Some(focusable);
        Ok(())
    }
    fn set_content_protection(&self, _enabled: bool) -> Result<(), WindowError> {
        Ok(())
    }
}

#[tokio::test]
async fn session_changes_drive_the_window() {
    let h = Harness::new("window-observer");
    let reconciler = Arc::new(WindowReconciler::new(LoggedWindow::default(), AppMode::LiveInterview));
    reconciler.show().unwrap();
    h.orchestrator.set_observer(reconciler.clone());
    assert_eq!(reconciler.window().last_opacity(), Some(0.6));

    h.capture(1).await;
    assert_eq!(reconciler.phase(), Phase::QueueNonEmpty);
    assert_eq!(reconciler.window().last_opacity(), Some(1.0));

    let writes = reconciler.window().writes();
    h.capture(1).await;
    assert_eq!(reconciler.window().writes(), writes, "same phase, no rewrite");

    h.orchestrator.solve().await;
    assert_eq!(reconciler.phase(), Phase::Show);

    h.orchestrator.reset();
    assert_eq!(reconciler.phase(), Phase::QueueEmpty);

    h.orchestrator.set_app_mode(AppMode::LeetcodeSolver);
    assert_eq!(*reconciler.window().focusable.lock().unwrap(), Some(true));
    assert_eq!(reconciler.window().last_opacity(), Some(0.85));
}

#[tokio::test]
async fn hidden_overlay_stays_hidden_through_captures() {
    let h = Harness::new("window-hidden");
    let reconciler = Arc::new(WindowReconciler::new(LoggedWindow::default(), AppMode::LiveInterview));
    h.orchestrator.set_observer(reconciler.clone());

    reconciler.hide().unwrap();
    h.capture(2).await;

    assert_eq!(reconciler.phase(), Phase::Hide);
    assert_eq!(reconciler.window().last_opacity(), Some(0.0));

    reconciler.show().unwrap();
    assert_eq!(reconciler.phase(), Phase::QueueNonEmpty);
}

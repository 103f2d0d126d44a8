//! Visibility tables: `(AppMode, Phase)` → native window attributes.
//!
//! Pure data. LIVE_INTERVIEW is a click-through, screen-share-invisible
//! overlay that never takes focus; LEETCODE_SOLVER is an ordinary floating
//! tool window. Content protection is on everywhere.

use crate::mode::AppMode;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Show,
    Hide,
    QueueEmpty,
    QueueNonEmpty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlwaysOnTopLevel {
    Normal,
    Floating,
    ScreenSaver,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowVisibilityConfig {
    pub opacity: f64,
    pub ignore_mouse_events: bool,
    pub skip_taskbar: bool,
    pub always_on_top: bool,
    pub always_on_top_level: AlwaysOnTopLevel,
    pub visible_on_all_workspaces: bool,
    pub visible_on_full_screen: bool,
    pub focusable: bool,
    pub content_protection: bool,
    /// macOS only: hide the dock icon. `None` leaves it untouched.
    pub hide_from_dock: Option<bool>,
}

/// The four phase configs for one app mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityTable {
    pub show: WindowVisibilityConfig,
    pub hide: WindowVisibilityConfig,
    pub queue_empty: WindowVisibilityConfig,
    pub queue_non_empty: WindowVisibilityConfig,
}

impl VisibilityTable {
    pub fn for_mode(mode: AppMode) -> Self {
        match mode {
            AppMode::LiveInterview => live_interview(),
            AppMode::LeetcodeSolver => leetcode_solver(),
        }
    }

    pub fn get(&self, phase: Phase) -> WindowVisibilityConfig {
        match phase {
            Phase::Show => self.show,
            Phase::Hide => self.hide,
            Phase::QueueEmpty => self.queue_empty,
            Phase::QueueNonEmpty => self.queue_non_empty,
        }
    }
}

pub fn compute_config(mode: AppMode, phase: Phase) -> WindowVisibilityConfig {
    VisibilityTable::for_mode(mode).get(phase)
}

fn live_interview() -> VisibilityTable {
    let show = WindowVisibilityConfig {
        opacity: 1.0,
        ignore_mouse_events: true,
        skip_taskbar: true,
        always_on_top: true,
        always_on_top_level: AlwaysOnTopLevel::ScreenSaver,
        visible_on_all_workspaces: true,
        visible_on_full_screen: true,
        focusable: false,
        content_protection: true,
        hide_from_dock: Some(true),
    };
    VisibilityTable {
        show,
        hide: WindowVisibilityConfig {
            opacity: 0.0,
            ..show
        },
        queue_empty: WindowVisibilityConfig {
            opacity: 0.6,
            ..show
        },
        queue_non_empty: show,
    }
}

fn leetcode_solver() -> VisibilityTable {
    let show = WindowVisibilityConfig {
        opacity: 1.0,
        ignore_mouse_events: false,
        skip_taskbar: false,
        always_on_top: true,
        always_on_top_level: AlwaysOnTopLevel::Floating,
        visible_on_all_workspaces: false,
        visible_on_full_screen: false,
        focusable: true,
        content_protection: true,
        hide_from_dock: Some(false),
    };
    VisibilityTable {
        show,
        hide: WindowVisibilityConfig {
            opacity: 0.0,
            ignore_mouse_events: true,
            always_on_top: false,
            always_on_top_level: AlwaysOnTopLevel::Normal,
            ..show
        },
        queue_empty: WindowVisibilityConfig {
            opacity: 0.85,
            ..show
        },
        queue_non_empty: show,
    }
}

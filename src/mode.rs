//! Application modes.
//!
//! The mode picks both the request strategy (how solve/debug calls are
//! shaped) and the window visibility table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppMode {
    /// Stealth overlay for live interviews: click-through, never focused.
    LiveInterview,
    /// Regular tool window for practice sessions.
    LeetcodeSolver,
}

impl AppMode {
    pub const ALL: [AppMode; 2] = [AppMode::LiveInterview, AppMode::LeetcodeSolver];

    pub fn as_str(self) -> &'static str {
        match self {
            AppMode::LiveInterview => "live_interview",
            AppMode::LeetcodeSolver => "leetcode_solver",
        }
    }
}

impl Default for AppMode {
    fn default() -> Self {
        AppMode::LiveInterview
    }
}

impl fmt::Display for AppMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown app mode: '{0}'")]
pub struct UnknownMode(pub String);

impl FromStr for AppMode {
    type Err = UnknownMode;

    /// Accepts `live_interview`, `LIVE_INTERVIEW`, `live-interview` and the
    /// same spellings of `leetcode_solver`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        match normalized.as_str() {
            "live_interview" => Ok(AppMode::LiveInterview),
            "leetcode_solver" => Ok(AppMode::LeetcodeSolver),
            _ => Err(UnknownMode(s.to_string())),
        }
    }
}

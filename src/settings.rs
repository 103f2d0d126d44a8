//! Settings: persisted JSON file plus environment overrides.
//!
//! Load order:
//! 1. `.env.local` → `.env` (dotenvy, first found wins)
//! 2. `settings.json` in the config dir (missing or corrupt ⇒ defaults)
//! 3. Environment variables (`SOLVER_API_URL`, `APP_MODE`, `IS_MOCK`, ...)

use crate::mode::AppMode;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

const APP_DIR: &str = "coder-overlay";
const SETTINGS_FILE: &str = "settings.json";

/// What to do when a solve (or debug) is requested while one is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// Refuse the second request; the first keeps running.
    #[default]
    Reject,
    /// The second request waits for, and reports, the first one's outcome.
    Coalesce,
    /// Cancel the first request silently and run the second.
    LastWins,
}

impl FromStr for OverlapPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "reject" => Ok(OverlapPolicy::Reject),
            "coalesce" => Ok(OverlapPolicy::Coalesce),
            "last_wins" => Ok(OverlapPolicy::LastWins),
            other => Err(format!("Unknown overlap policy: '{}'", other)),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Settings I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings JSON invalid: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_base_url: String,
    pub language: String,
    pub locale: String,
    pub app_mode: AppMode,
    /// Ask the service for canned responses.
    pub is_mock: bool,
    /// Self-hosted deployments send no auth header at all.
    pub self_hosted: bool,
    pub overlap_policy: OverlapPolicy,
    /// `None` keeps the extra queue unbounded.
    pub max_extra_screenshots: Option<usize>,
    /// `None` ⇒ `<data dir>/coder-overlay`.
    pub screenshot_dir: Option<PathBuf>,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000".to_string(),
            language: "python".to_string(),
            locale: "en-US".to_string(),
            app_mode: AppMode::default(),
            is_mock: false,
            self_hosted: false,
            overlap_policy: OverlapPolicy::default(),
            max_extra_screenshots: None,
            screenshot_dir: None,
            request_timeout_secs: crate::solver::REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    /// Path to `settings.json`.
    pub fn settings_path() -> Option<PathBuf> {
        dirs::config_dir().map(|c| c.join(APP_DIR).join(SETTINGS_FILE))
    }

    /// Settings file + process environment.
    pub fn load() -> Self {
        let mut settings = match Self::settings_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        };
        settings.apply_overrides(|key| std::env::var(key).ok());
        settings
    }

    /// Read `path`; a missing file gives defaults, a corrupt one too (with a warning).
    pub fn load_from(path: &Path) -> Self {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str::<Self>(&json) {
            Ok(settings) => settings.sanitized(),
            Err(e) => {
                log::warn!("[SETTINGS] Ignoring corrupt {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<(), SettingsError> {
        let path = Self::settings_path().ok_or(SettingsError::NoConfigDir)?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::info!("[SETTINGS] Saved {}", path.display());
        Ok(())
    }

    /// Apply environment overrides. `lookup` is `std::env::var` in production;
    /// tests pass a map.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("SOLVER_API_URL").filter(|v| !v.is_empty()) {
            self.api_base_url = url;
        }
        if let Some(language) = lookup("SOLVER_LANGUAGE").filter(|v| !v.is_empty()) {
            self.language = language;
        }
        if let Some(locale) = lookup("SOLVER_LOCALE").filter(|v| !v.is_empty()) {
            self.locale = locale;
        }
        if let Some(raw) = lookup("APP_MODE") {
            match raw.parse::<AppMode>() {
                Ok(mode) => self.app_mode = mode,
                Err(e) => log::warn!("[SETTINGS] {}, keeping {}", e, self.app_mode),
            }
        }
        if let Some(flag) = lookup("IS_MOCK").and_then(|v| parse_bool(&v)) {
            self.is_mock = flag;
        }
        if let Some(flag) = lookup("SELF_HOSTED").and_then(|v| parse_bool(&v)) {
            self.self_hosted = flag;
        }
        if let Some(raw) = lookup("OVERLAP_POLICY") {
            match raw.parse::<OverlapPolicy>() {
                Ok(policy) => self.overlap_policy = policy,
                Err(e) => log::warn!("[SETTINGS] {}, keeping {:?}", e, self.overlap_policy),
            }
        }
        if let Some(raw) = lookup("EXTRA_QUEUE_CAPACITY") {
            match raw.trim().to_lowercase().as_str() {
                "" | "none" | "unbounded" => self.max_extra_screenshots = None,
                n => match n.parse::<usize>() {
                    Ok(cap) if cap > 0 => self.max_extra_screenshots = Some(cap),
                    _ => log::warn!("[SETTINGS] Invalid EXTRA_QUEUE_CAPACITY '{}'", raw),
                },
            }
        }
        if let Some(dir) = lookup("SCREENSHOT_DIR").filter(|v| !v.is_empty()) {
            self.screenshot_dir = Some(PathBuf::from(dir));
        }
    }

    /// Root directory for both screenshot queues.
    pub fn resolved_screenshot_dir(&self) -> PathBuf {
        self.screenshot_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join(APP_DIR)
        })
    }

    /// Extra-queue cap as the queue takes it. A zero cap would evict every
    /// capture on arrival, so it counts as unbounded.
    pub fn extra_capacity(&self) -> Option<NonZeroUsize> {
        self.max_extra_screenshots.and_then(NonZeroUsize::new)
    }

    /// Clamped to 1..=300 seconds.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .clamp(1, crate::solver::REQUEST_TIMEOUT_SECS),
        )
    }

    /// Drop values that deserialize fine but cannot be honoured.
    fn sanitized(mut self) -> Self {
        if self.max_extra_screenshots == Some(0) {
            log::warn!("[SETTINGS] max_extra_screenshots = 0 ignored, extra queue unbounded");
            self.max_extra_screenshots = None;
        }
        let clamped = self
            .request_timeout_secs
            .clamp(1, crate::solver::REQUEST_TIMEOUT_SECS);
        if clamped != self.request_timeout_secs {
            log::warn!(
                "[SETTINGS] request_timeout_secs = {} out of range, using {}",
                self.request_timeout_secs,
                clamped
            );
            self.request_timeout_secs = clamped;
        }
        self
    }
}

/// Load `.env.local`, else `.env`, from `dir`. Runs before the logger is
/// up, so the caller logs the returned path.
pub fn load_dotenv(dir: &Path) -> Option<PathBuf> {
    for env_file in [".env.local", ".env"] {
        let path = dir.join(env_file);
        if path.exists() {
            return match dotenvy::from_path(&path) {
                Ok(_) => Some(path),
                Err(e) => {
                    eprintln!("[SETTINGS] Failed to load {}: {}", path.display(), e);
                    None
                }
            };
        }
    }
    None
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

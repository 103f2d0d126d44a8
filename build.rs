//! Build script for the coder-overlay crate.
//!
//! Only the `desktop` feature needs a build step: Tauri generates its
//! context (config, embedded assets, icon) from `tauri.conf.json`.
//! The headless core has nothing to generate.

fn main() {
    #[cfg(feature = "desktop")]
    tauri_build::build();
}

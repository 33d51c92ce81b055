//! Launch configuration for the Chromium-backed engine.

use std::{env, path::PathBuf};

use which::which;

/// Configuration for launching the browser behind the bridge.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Chrome/Chromium binary. `None` lets chromiumoxide pick its own.
    pub executable: Option<PathBuf>,
    /// Run without a visible window. The workflow is watchable, so the
    /// default keeps the window on screen.
    pub headless: bool,
    /// Isolated profile directory, if any.
    pub user_data_dir: Option<PathBuf>,
    /// The workflow never needs images; skipping them speeds every reload.
    pub load_images: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            executable: detect_chrome_executable(),
            headless: false,
            user_data_dir: None,
            load_images: false,
        }
    }
}

/// Locate a usable Chrome/Chromium binary. `GROUPUNBAN_CHROME` wins when
/// it points at an existing file; otherwise well-known names are tried on
/// the PATH.
pub fn detect_chrome_executable() -> Option<PathBuf> {
    if let Ok(raw) = env::var("GROUPUNBAN_CHROME") {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            let candidate = PathBuf::from(trimmed);
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    for name in chrome_executable_names() {
        if let Ok(path) = which(name) {
            return Some(path);
        }
    }

    None
}

fn chrome_executable_names() -> &'static [&'static str] {
    #[cfg(target_os = "windows")]
    {
        &["chrome.exe", "chromium.exe", "msedge.exe"]
    }

    #[cfg(not(target_os = "windows"))]
    {
        &[
            "google-chrome",
            "google-chrome-stable",
            "chromium",
            "chromium-browser",
            "chrome",
        ]
    }
}

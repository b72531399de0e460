//! Configuration paths
//!
//! Uses the directories crate for platform-appropriate locations.

use std::io;
use std::path::PathBuf;

/// Name used for the configuration directory
const PROJECT_NAME: &str = "queue-harness";

/// Get the configuration directory path
///
/// - Linux: `~/.config/queue-harness/`
/// - macOS: `~/Library/Application Support/queue-harness/`
/// - Windows: `%APPDATA%\queue-harness\`
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", PROJECT_NAME)
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Ensure the configuration directory exists
pub fn ensure_config_dir() -> io::Result<Option<PathBuf>> {
    if let Some(dir) = config_dir() {
        if !dir.exists() {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(Some(dir))
    } else {
        Ok(None)
    }
}

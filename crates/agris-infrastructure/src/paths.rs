//! Unified path management for AGRIS client files.
//!
//! All locally persisted client state lives under the platform config
//! directory. None of the cache or guard state is persisted; the only file
//! written today is the login preferences.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/agris/                 # Config directory (platform-dependent)
//! └── login_preferences.toml       # "Remember me" flag and last-used email
//! ```

use agris_core::error::{AgrisError, Result};
use std::path::PathBuf;

/// Unified path management for AGRIS.
pub struct AgrisPaths;

impl AgrisPaths {
    /// Returns the AGRIS configuration directory.
    ///
    /// Uses the platform config directory (XDG on Linux, `Library/Application
    /// Support` on macOS, `AppData\Roaming` on Windows).
    ///
    /// # Errors
    ///
    /// Returns an error if the platform config directory cannot be
    /// determined.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("agris"))
            .ok_or_else(|| AgrisError::storage("Cannot determine platform config directory"))
    }

    /// Returns the path of the login preferences file.
    pub fn login_preferences_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("login_preferences.toml"))
    }
}

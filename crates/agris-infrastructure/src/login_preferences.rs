//! Persisted login preferences.
//!
//! The login form remembers whether the user opted into "remember me" and the
//! last email used, stored as TOML under the platform config directory. This
//! is the only client state that survives a restart; all cache and guard
//! state is in-memory only.
//!
//! Writes are atomic (temp file + fsync + rename) and read-modify-write
//! cycles hold an exclusive file lock, so two client processes cannot
//! corrupt the file.

use crate::paths::AgrisPaths;
use agris_core::error::{AgrisError, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};

/// Login preferences persisted across restarts.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LoginPreferences {
    /// Whether the user asked to be remembered on this device.
    #[serde(default)]
    pub remember_me: bool,
    /// Last email used to sign in, kept only while `remember_me` is set.
    #[serde(default)]
    pub last_email: Option<String>,
}

/// Storage for the login preferences file.
pub struct LoginPreferencesStore {
    path: PathBuf,
}

impl LoginPreferencesStore {
    /// Creates a store for the given file path.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Creates a store at the default platform location.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform config directory cannot be
    /// determined.
    pub fn default_location() -> Result<Self> {
        Ok(Self::new(AgrisPaths::login_preferences_file()?))
    }

    /// Loads the preferences, returning defaults when the file does not
    /// exist or is empty.
    pub fn load(&self) -> Result<LoginPreferences> {
        if !self.path.exists() {
            return Ok(LoginPreferences::default());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(LoginPreferences::default());
        }

        Ok(toml::from_str(&content)?)
    }

    /// Saves the preferences atomically.
    ///
    /// Writes to a temp file in the same directory, fsyncs, then renames
    /// over the target so a crash never leaves a half-written file.
    pub fn save(&self, preferences: &LoginPreferences) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let toml_string = toml::to_string_pretty(preferences)?;

        let tmp_path = self.temp_path()?;
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(toml_string.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;

        Ok(())
    }

    /// Performs a locked read-modify-write cycle.
    pub fn update<F>(&self, f: F) -> Result<LoginPreferences>
    where
        F: FnOnce(&mut LoginPreferences),
    {
        let _lock = FileLock::acquire(&self.path)?;

        let mut preferences = self.load()?;
        f(&mut preferences);
        self.save(&preferences)?;

        Ok(preferences)
    }

    /// Records the email to prefill on the next login.
    pub fn remember(&self, email: &str) -> Result<LoginPreferences> {
        self.update(|prefs| {
            prefs.remember_me = true;
            prefs.last_email = Some(email.to_string());
        })
    }

    /// Clears the remembered email.
    pub fn forget(&self) -> Result<LoginPreferences> {
        self.update(|prefs| {
            prefs.remember_me = false;
            prefs.last_email = None;
        })
    }

    fn temp_path(&self) -> Result<PathBuf> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| AgrisError::storage("Preferences path has no parent directory"))?;
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| AgrisError::storage("Preferences path has no file name"))?;
        Ok(parent.join(format!(".{}.tmp", file_name.to_string_lossy())))
    }
}

/// A file lock guard that releases the lock when dropped.
struct FileLock {
    #[allow(dead_code)]
    file: File,
    lock_path: PathBuf,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self> {
        let lock_path = path.with_extension("lock");

        if let Some(parent) = lock_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        #[cfg(unix)]
        {
            use fs2::FileExt;
            file.lock_exclusive()
                .map_err(|e| AgrisError::storage(format!("Failed to acquire lock: {}", e)))?;
        }

        #[cfg(not(unix))]
        {
            // On non-Unix systems we skip file locking; single-user desktop
            // clients do not run concurrent writers there.
        }

        Ok(FileLock { file, lock_path })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // Unlock is automatic when the file handle is dropped
        let _ = fs::remove_file(&self.lock_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let store = LoginPreferencesStore::new(temp_dir.path().join("login_preferences.toml"));

        let prefs = store.load().unwrap();
        assert!(!prefs.remember_me);
        assert!(prefs.last_email.is_none());
    }

    #[test]
    fn test_remember_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = LoginPreferencesStore::new(temp_dir.path().join("login_preferences.toml"));

        store.remember("grower@example.com").unwrap();

        let prefs = store.load().unwrap();
        assert!(prefs.remember_me);
        assert_eq!(prefs.last_email.as_deref(), Some("grower@example.com"));
    }

    #[test]
    fn test_forget_clears_email() {
        let temp_dir = TempDir::new().unwrap();
        let store = LoginPreferencesStore::new(temp_dir.path().join("login_preferences.toml"));

        store.remember("grower@example.com").unwrap();
        store.forget().unwrap();

        let prefs = store.load().unwrap();
        assert!(!prefs.remember_me);
        assert!(prefs.last_email.is_none());
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("login_preferences.toml");
        let store = LoginPreferencesStore::new(path.clone());

        store.save(&LoginPreferences::default()).unwrap();

        assert!(path.exists());
        assert!(!temp_dir.path().join(".login_preferences.toml.tmp").exists());
    }
}

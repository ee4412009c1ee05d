//! Persisted auth session storage.
//!
//! Keeps the last established `AuthSession` in `~/.config/inkpost/session.json`
//! so a signed-in user stays signed in across CLI invocations.

use chrono::Utc;
use inkpost_core::error::{InkpostError, Result};
use inkpost_core::session::{AuthSession, SessionRepository};
use std::fs;
use std::path::PathBuf;

use crate::paths::InkpostPaths;

/// Storage for the persisted session file (session.json).
///
/// Responsibilities:
/// - Load, save and clear session.json
/// - Drop sessions that have already expired
///
/// Does NOT:
/// - Refresh tokens
/// - Encrypt the file (plaintext JSON, mode 600 on Unix)
pub struct SessionStorage {
    path: PathBuf,
}

impl SessionStorage {
    /// Creates a SessionStorage with the default path.
    pub fn new() -> Result<Self> {
        let path = InkpostPaths::session_file().map_err(|e| InkpostError::config(e.to_string()))?;
        Ok(Self { path })
    }

    /// Creates a SessionStorage with a custom path (for testing).
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Loads the stored session.
    ///
    /// Returns `Ok(None)` when no file exists or the stored session expired.
    pub fn load(&self) -> Result<Option<AuthSession>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        let session: AuthSession = serde_json::from_str(&content)?;

        if session.is_expired(Utc::now()) {
            tracing::debug!("Discarding expired session for {}", session.user.email);
            self.clear()?;
            return Ok(None);
        }

        Ok(Some(session))
    }

    /// Writes the session, replacing any previous one.
    pub fn save(&self, session: &AuthSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, content)?;
        restrict_permissions(&self.path)?;

        Ok(())
    }

    /// Removes the stored session. Missing files are fine.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl SessionRepository for SessionStorage {
    fn load(&self) -> Result<Option<AuthSession>> {
        SessionStorage::load(self)
    }

    fn save(&self, session: &AuthSession) -> Result<()> {
        SessionStorage::save(self, session)
    }

    fn clear(&self) -> Result<()> {
        SessionStorage::clear(self)
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &PathBuf) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &PathBuf) -> Result<()> {
    Ok(())
}

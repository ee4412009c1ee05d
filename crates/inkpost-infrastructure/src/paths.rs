//! Unified path management for inkpost files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/inkpost/           # Config directory (platform config dir)
//! ├── config.toml              # Client configuration
//! ├── session.json             # Persisted auth session
//! └── cooldowns.json           # Last comment post time per user
//! ```

use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
        }
    }
}

impl std::error::Error for PathError {}

const APP_DIR: &str = "inkpost";

/// Path resolution for inkpost.
pub struct InkpostPaths;

impl InkpostPaths {
    /// Returns the inkpost configuration directory (e.g. `~/.config/inkpost/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::ConfigDirNotFound)
    }

    /// Returns the path to `config.toml`.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the path to the persisted session.
    ///
    /// # Security Note
    ///
    /// The file holds bearer tokens; it is written with mode 600 on Unix.
    pub fn session_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("session.json"))
    }

    /// Returns the path to the persisted comment cooldowns.
    pub fn cooldown_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("cooldowns.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_files_live_in_config_dir() {
        let Ok(dir) = InkpostPaths::config_dir() else {
            return;
        };
        assert!(dir.ends_with(APP_DIR));
        assert_eq!(InkpostPaths::config_file().unwrap(), dir.join("config.toml"));
        assert_eq!(InkpostPaths::session_file().unwrap(), dir.join("session.json"));
        assert_eq!(InkpostPaths::cooldown_file().unwrap(), dir.join("cooldowns.json"));
    }
}

//! Persisted comment cooldowns.
//!
//! Every CLI invocation is a new process, so the time of each user's last
//! comment lives in `~/.config/inkpost/cooldowns.json` next to the session.

use chrono::{DateTime, Utc};
use inkpost_core::error::{InkpostError, Result};
use inkpost_core::session::CooldownRepository;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use crate::paths::InkpostPaths;

/// Storage for cooldowns.json, a map of user id to last post time.
pub struct CooldownStorage {
    path: PathBuf,
}

impl CooldownStorage {
    /// Creates a CooldownStorage with the default path.
    pub fn new() -> Result<Self> {
        let path =
            InkpostPaths::cooldown_file().map_err(|e| InkpostError::config(e.to_string()))?;
        Ok(Self { path })
    }

    /// Creates a CooldownStorage with a custom path (for testing).
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Loads all recorded post times. A missing file is an empty map.
    pub fn load(&self) -> Result<HashMap<String, DateTime<Utc>>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }

        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Records a post time for `user_id`, keeping the other users' entries.
    pub fn record(&self, user_id: &str, at: DateTime<Utc>) -> Result<()> {
        let mut entries = match self.load() {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Replacing unreadable cooldown file: {}", e);
                HashMap::new()
            }
        };
        entries.insert(user_id.to_string(), at);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&entries)?)?;
        Ok(())
    }
}

impl CooldownRepository for CooldownStorage {
    fn load(&self) -> Result<HashMap<String, DateTime<Utc>>> {
        CooldownStorage::load(self)
    }

    fn record(&self, user_id: &str, at: DateTime<Utc>) -> Result<()> {
        CooldownStorage::record(self, user_id, at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_load_nonexistent_file() {
        let temp_dir = TempDir::new().unwrap();
        let storage = CooldownStorage::with_path(temp_dir.path().join("cooldowns.json"));

        assert!(storage.load().unwrap().is_empty());
    }

    #[test]
    fn test_record_keeps_other_users() {
        let temp_dir = TempDir::new().unwrap();
        let storage = CooldownStorage::with_path(temp_dir.path().join("nested/cooldowns.json"));
        let first = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2024, 5, 1, 12, 5, 0).unwrap();

        storage.record("u-1", first).unwrap();
        storage.record("u-2", first).unwrap();
        storage.record("u-1", second).unwrap();

        let entries = storage.load().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries["u-1"], second);
        assert_eq!(entries["u-2"], first);
    }

    #[test]
    fn test_record_replaces_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cooldowns.json");
        fs::write(&path, "{ invalid json").unwrap();
        let storage = CooldownStorage::with_path(path);
        assert!(matches!(
            storage.load(),
            Err(InkpostError::Serialization { .. })
        ));

        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        storage.record("u-1", at).unwrap();

        assert_eq!(storage.load().unwrap()["u-1"], at);
    }
}

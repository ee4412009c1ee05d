//! Configuration service implementation.
//!
//! Loads `AppConfig` from `~/.config/inkpost/config.toml` and applies the
//! `INKPOST_URL` / `INKPOST_ANON_KEY` environment overrides.

use inkpost_core::config::AppConfig;
use inkpost_core::error::{InkpostError, Result};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use crate::paths::InkpostPaths;

pub const URL_ENV: &str = "INKPOST_URL";
pub const ANON_KEY_ENV: &str = "INKPOST_ANON_KEY";

/// Configuration service that loads and caches the client configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    /// Cached configuration, loaded lazily on first access.
    config: Arc<RwLock<Option<AppConfig>>>,
}

impl ConfigService {
    /// Creates a service reading the default config file.
    pub fn new() -> Result<Self> {
        let path = InkpostPaths::config_file().map_err(|e| InkpostError::config(e.to_string()))?;
        Ok(Self::with_path(path))
    }

    /// Creates a service reading a custom path (for testing and `--config`).
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Gets the configuration, loading it from file if not cached.
    pub fn get_config(&self) -> Result<AppConfig> {
        if let Ok(read_lock) = self.config.read()
            && let Some(cached) = read_lock.as_ref()
        {
            return Ok(cached.clone());
        }

        let mut loaded = self.load_file()?;
        apply_env_overrides(&mut loaded, |name| std::env::var(name).ok());

        if let Ok(mut write_lock) = self.config.write() {
            *write_lock = Some(loaded.clone());
        }

        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        if let Ok(mut write_lock) = self.config.write() {
            *write_lock = None;
        }
    }

    /// Reads the TOML file. A missing or empty file yields defaults.
    fn load_file(&self) -> Result<AppConfig> {
        if !self.path.exists() {
            tracing::debug!("No config file at {}, using defaults", self.path.display());
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| InkpostError::io(format!("Failed to read config file: {}", e)))?;

        if content.trim().is_empty() {
            return Ok(AppConfig::default());
        }

        Ok(toml::from_str(&content)?)
    }
}

/// Environment values win over the file for the backend credentials.
fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(URL_ENV).filter(|v| !v.trim().is_empty()) {
        config.backend.url = Some(url);
    }
    if let Some(key) = lookup(ANON_KEY_ENV).filter(|v| !v.trim().is_empty()) {
        config.backend.anon_key = Some(key);
    }
}

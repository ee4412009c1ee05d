//! Client configuration model.
//!
//! Mirrors `config.toml`. Every section has defaults so a partial or missing
//! file still yields a usable configuration; only the backend URL and key
//! have to be supplied (by file or environment) before talking to a remote
//! backend.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{InkpostError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendSettings,
    pub storage: StorageSettings,
    pub comments: CommentSettings,
    pub pagination: PaginationSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    /// Project URL, e.g. `https://abc.supabase.co`.
    pub url: Option<String>,
    /// Public (anon) API key.
    pub anon_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            url: None,
            anon_key: None,
            timeout_secs: 30,
        }
    }
}

impl BackendSettings {
    /// Returns `(url, anon_key)` or a `Config` error naming what is missing.
    pub fn credentials(&self) -> Result<(&str, &str)> {
        let url = self
            .url
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| InkpostError::config("backend.url is not set (or INKPOST_URL)"))?;
        let key = self
            .anon_key
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                InkpostError::config("backend.anon_key is not set (or INKPOST_ANON_KEY)")
            })?;
        Ok((url, key))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub blog_bucket: String,
    pub comment_bucket: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            blog_bucket: "blog-images".to_string(),
            comment_bucket: "comment-images".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentSettings {
    /// Minimum seconds between two comments by the same user.
    pub cooldown_secs: u64,
}

impl Default for CommentSettings {
    fn default() -> Self {
        Self { cooldown_secs: 10 }
    }
}

impl CommentSettings {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationSettings {
    pub per_page: usize,
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self { per_page: 5 }
    }
}

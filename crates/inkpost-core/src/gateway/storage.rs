//! Blob storage contract.

use async_trait::async_trait;

use crate::error::Result;

/// Options for a single upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    /// Overwrite an existing object with the same key.
    pub upsert: bool,
    pub content_type: String,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            upsert: true,
            content_type: "application/octet-stream".to_string(),
        }
    }
}

/// Bucketed blob storage with publicly resolvable object URLs.
#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// Uploads `bytes` under `bucket/key`.
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        options: UploadOptions,
    ) -> Result<()>;

    /// Public URL of `bucket/key`. Pure string construction, never fails.
    fn public_url(&self, bucket: &str, key: &str) -> String;

    /// Removes the given objects from `bucket`.
    async fn remove(&self, bucket: &str, keys: &[String]) -> Result<()>;
}

//! Upload and removal of entity images.

use chrono::Utc;
use inkpost_core::error::{InkpostError, Result};
use inkpost_core::gateway::{StorageGateway, UploadOptions};
use inkpost_core::image::{ImageFile, storage_key_from_reference};
use std::sync::Arc;

/// Shared image helper used by both entity stores.
///
/// Uploads resolve to public URLs immediately so the stored `image_url`
/// is always directly displayable. Deletion is best-effort: a blob that
/// cannot be removed is logged and left behind.
#[derive(Clone)]
pub struct ImageAttachments {
    storage: Arc<dyn StorageGateway>,
}

impl ImageAttachments {
    pub fn new(storage: Arc<dyn StorageGateway>) -> Self {
        Self { storage }
    }

    /// Uploads `file` to `bucket` under a fresh `key_prefix` key and
    /// returns its public URL.
    ///
    /// # Errors
    ///
    /// `Validation` for an empty file, `Upload` when the storage call fails.
    pub async fn upload(&self, bucket: &str, key_prefix: &str, file: &ImageFile) -> Result<String> {
        if file.bytes.is_empty() {
            return Err(InkpostError::validation("Image file is empty"));
        }

        let key = file.storage_key(key_prefix, Utc::now());
        let options = UploadOptions {
            upsert: true,
            content_type: file.content_type(),
        };

        tracing::debug!(bucket, key = %key, size = file.bytes.len(), "Uploading image");
        self.storage
            .upload(bucket, &key, file.bytes.clone(), options)
            .await
            .map_err(|e| InkpostError::upload(format!("Failed to upload image: {}", e)))?;

        Ok(self.storage.public_url(bucket, &key))
    }

    /// Removes the blob behind `reference`, logging instead of failing.
    pub async fn delete(&self, bucket: &str, reference: &str) {
        let public_prefix = self.storage.public_url(bucket, "");
        let Some(key) = storage_key_from_reference(&public_prefix, reference) else {
            tracing::debug!(bucket, reference, "Image reference is outside the bucket, skipping");
            return;
        };

        match self.storage.remove(bucket, std::slice::from_ref(&key)).await {
            Ok(()) => tracing::debug!(bucket, key = %key, "Removed image"),
            Err(e) => tracing::warn!(bucket, key = %key, error = %e, "Failed to remove image"),
        }
    }
}

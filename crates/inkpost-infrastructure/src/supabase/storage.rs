use async_trait::async_trait;
use inkpost_core::error::Result;
use inkpost_core::gateway::{StorageGateway, UploadOptions};
use reqwest::Method;
use serde_json::json;

use super::SupabaseGateway;

#[async_trait]
impl StorageGateway for SupabaseGateway {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        options: UploadOptions,
    ) -> Result<()> {
        tracing::debug!(bucket, key, size = bytes.len(), "upload");
        let url = self.url(&format!("storage/v1/object/{bucket}/{key}"));
        self.send(
            self.request(Method::POST, url)
                .header("x-upsert", if options.upsert { "true" } else { "false" })
                .header("content-type", options.content_type)
                .body(bytes),
        )
        .await?;
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        self.url(&format!("storage/v1/object/public/{bucket}/{key}"))
    }

    async fn remove(&self, bucket: &str, keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }
        tracing::debug!(bucket, ?keys, "remove");
        let url = self.url(&format!("storage/v1/object/{bucket}"));
        self.send(
            self.request(Method::DELETE, url)
                .json(&json!({ "prefixes": keys })),
        )
        .await?;
        Ok(())
    }
}

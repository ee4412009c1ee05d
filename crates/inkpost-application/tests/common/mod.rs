#![allow(dead_code)]

use async_trait::async_trait;
use inkpost_application::{CommentRateLimiter, CommentStore, ImageAttachments, BlogStore};
use inkpost_core::error::Result;
use inkpost_core::gateway::{Filter, Query, TableGateway};
use inkpost_infrastructure::MemoryGateway;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Notify;

pub const BLOG_BUCKET: &str = "blog-images";
pub const COMMENT_BUCKET: &str = "comment-images";

/// Table gateway that can park calls until the test releases them.
///
/// `select` reads its rows before parking, so a released response carries
/// the data as it was when the call was made.
pub struct GatedTable {
    pub inner: Arc<MemoryGateway>,
    hold: AtomicBool,
    entered: Notify,
    release: Notify,
}

impl GatedTable {
    pub fn new(inner: Arc<MemoryGateway>) -> Self {
        Self {
            inner,
            hold: AtomicBool::new(false),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }

    /// Parks every later call until `release`.
    pub fn hold(&self, on: bool) {
        self.hold.store(on, Ordering::SeqCst);
    }

    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }

    async fn gate(&self) {
        if self.hold.load(Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
    }
}

#[async_trait]
impl TableGateway for GatedTable {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>> {
        let rows = self.inner.select(table, query).await;
        self.gate().await;
        rows
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>> {
        self.gate().await;
        self.inner.insert(table, rows).await
    }

    async fn update(&self, table: &str, filter: &Filter, patch: Value) -> Result<Vec<Value>> {
        self.gate().await;
        self.inner.update(table, filter, patch).await
    }

    async fn delete(&self, table: &str, filter: &Filter) -> Result<()> {
        self.gate().await;
        self.inner.delete(table, filter).await
    }
}

pub fn blog_store(table: Arc<dyn TableGateway>, gateway: &Arc<MemoryGateway>) -> BlogStore {
    BlogStore::new(
        table,
        ImageAttachments::new(gateway.clone()),
        BLOG_BUCKET,
    )
}

pub fn comment_store(
    table: Arc<dyn TableGateway>,
    gateway: &Arc<MemoryGateway>,
    cooldown: Duration,
) -> CommentStore {
    CommentStore::new(
        table,
        ImageAttachments::new(gateway.clone()),
        COMMENT_BUCKET,
        CommentRateLimiter::new(cooldown),
    )
}

/// Seeds a blog row with an explicit timestamp.
pub fn seed_blog(gateway: &MemoryGateway, id: i64, title: &str, created_at: &str) {
    gateway.seed(
        "blogs",
        json!({
            "id": id,
            "title": title,
            "content": format!("{title} body"),
            "user_id": "u-1",
            "user_name": "Ada",
            "created_at": created_at,
            "image_url": null
        }),
    );
}

/// Seeds a comment row with an explicit timestamp.
pub fn seed_comment(gateway: &MemoryGateway, id: i64, blog_id: i64, content: &str, created_at: &str) {
    gateway.seed(
        "comments",
        json!({
            "id": id,
            "blog_id": blog_id,
            "content": content,
            "user_id": "u-1",
            "user_name": "Ada",
            "created_at": created_at,
            "image_url": null
        }),
    );
}

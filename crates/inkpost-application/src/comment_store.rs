//! Comment entity store, scoped to one blog at a time.

use inkpost_core::blog::BlogId;
use inkpost_core::comment::{Comment, CommentId, CommentPatch, NewComment};
use inkpost_core::entity::Entity;
use inkpost_core::error::{InkpostError, Result};
use inkpost_core::gateway::{Filter, Order, Query, TableGateway};
use inkpost_core::image::ImageChange;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::RwLock;

use crate::collection::{Direction, SortedCollection, decode_rows, fetch_by_id, single_row};
use crate::image_attachments::ImageAttachments;
use crate::in_flight::InFlight;
use crate::rate_limiter::CommentRateLimiter;

const KEY_PREFIX: &str = "comment";
const OPERATION: &str = "comment mutation";

struct Thread {
    /// Blog whose comments are mirrored, set by the latest successful
    /// `fetch_all`.
    blog_id: Option<BlogId>,
    comments: SortedCollection<Comment>,
}

/// In-memory mirror of one blog's comments, oldest first.
///
/// Shares the consistency and concurrency rules of `BlogStore`. In
/// addition, creation is throttled per user by a `CommentRateLimiter`, and
/// a created comment is only mirrored when it belongs to the active blog.
pub struct CommentStore {
    table: Arc<dyn TableGateway>,
    images: ImageAttachments,
    bucket: String,
    rate_limiter: CommentRateLimiter,
    thread: RwLock<Thread>,
    loading: AtomicBool,
    posting: AtomicBool,
    generation: AtomicU64,
}

impl CommentStore {
    pub fn new(
        table: Arc<dyn TableGateway>,
        images: ImageAttachments,
        bucket: impl Into<String>,
        rate_limiter: CommentRateLimiter,
    ) -> Self {
        Self {
            table,
            images,
            bucket: bucket.into(),
            rate_limiter,
            thread: RwLock::new(Thread {
                blog_id: None,
                comments: SortedCollection::new(Direction::OldestFirst),
            }),
            loading: AtomicBool::new(false),
            posting: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }

    pub async fn comments(&self) -> Vec<Comment> {
        self.thread.read().await.comments.items().to_vec()
    }

    /// Blog whose comments are currently mirrored.
    pub async fn active_blog(&self) -> Option<BlogId> {
        self.thread.read().await.blog_id
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    pub fn is_posting(&self) -> bool {
        self.posting.load(Ordering::Acquire)
    }

    pub fn rate_limiter(&self) -> &CommentRateLimiter {
        &self.rate_limiter
    }

    /// Reloads the comments of `blog_id`, oldest first, and makes it the
    /// active blog.
    ///
    /// The active blog and its comments are swapped together, and only by
    /// the latest successful fetch. A failed or superseded fetch leaves the
    /// mirrored thread untouched.
    pub async fn fetch_all(&self, blog_id: BlogId) -> Result<Vec<Comment>> {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.loading.store(true, Ordering::Release);

        let query = Query::new()
            .filter(Filter::eq("blog_id", blog_id))
            .order(Order::ascending("created_at"));
        let result = self
            .table
            .select(Comment::TABLE, &query)
            .await
            .and_then(decode_rows::<Comment>);

        let latest = self.generation.load(Ordering::Acquire) == generation;
        if latest {
            self.loading.store(false, Ordering::Release);
        }

        let comments = result?;
        if latest {
            let mut thread = self.thread.write().await;
            thread.blog_id = Some(blog_id);
            thread.comments.replace_all(comments.clone());
            tracing::debug!(blog_id, count = comments.len(), "Fetched comments");
        } else {
            tracing::debug!(blog_id, generation, "Discarding superseded comment fetch");
        }
        Ok(comments)
    }

    /// Posts a comment and appends it when it belongs to the active blog.
    ///
    /// # Errors
    ///
    /// - `Validation` when signed out or the content is blank
    /// - `RateLimited` while the author's cooldown is running
    /// - `Upload` when the attached image could not be stored
    pub async fn create(&self, new_comment: NewComment) -> Result<Comment> {
        let owner_id = new_comment.validate()?;
        self.rate_limiter.check(owner_id)?;
        let _posting = InFlight::acquire(&self.posting, OPERATION)?;

        let image_url = match &new_comment.image {
            Some(file) => Some(self.images.upload(&self.bucket, KEY_PREFIX, file).await?),
            None => None,
        };

        let row = new_comment.to_row(owner_id, image_url.clone());
        let inserted = match self.table.insert(Comment::TABLE, vec![row]).await {
            Ok(rows) => decode_rows::<Comment>(rows).and_then(|comments| {
                comments
                    .into_iter()
                    .next()
                    .ok_or_else(|| InkpostError::gateway("Insert returned no comment"))
            }),
            Err(e) => Err(e),
        };

        let comment = match inserted {
            Ok(comment) => comment,
            Err(e) => {
                if let Some(url) = &image_url {
                    self.images.delete(&self.bucket, url).await;
                }
                return Err(e);
            }
        };

        self.rate_limiter.record(owner_id);

        let mut thread = self.thread.write().await;
        if thread.blog_id == Some(comment.blog_id) {
            thread.comments.insert_created(comment.clone());
        }
        drop(thread);

        tracing::info!(comment_id = comment.id, blog_id = comment.blog_id, "Created comment");
        Ok(comment)
    }

    /// Applies `patch` to comment `id`, replacing the local entry in place.
    pub async fn update(&self, id: CommentId, patch: CommentPatch) -> Result<Comment> {
        patch.validate()?;
        let _posting = InFlight::acquire(&self.posting, OPERATION)?;

        let previous_image = match patch.image {
            ImageChange::Keep => None,
            _ => self.lookup(id).await?.and_then(|comment| comment.image_url),
        };

        let image_url = match &patch.image {
            ImageChange::Keep => None,
            ImageChange::Remove => Some(None),
            ImageChange::Replace(file) => {
                Some(Some(self.images.upload(&self.bucket, KEY_PREFIX, file).await?))
            }
        };

        let updated = match self
            .table
            .update(Comment::TABLE, &Filter::eq("id", id), patch.to_row(image_url.clone()))
            .await
        {
            Ok(rows) => single_row::<Comment>(rows, id),
            Err(e) => Err(e),
        };

        let comment = match updated {
            Ok(comment) => comment,
            Err(e) => {
                if let Some(Some(url)) = &image_url {
                    self.images.delete(&self.bucket, url).await;
                }
                return Err(e);
            }
        };

        self.thread.write().await.comments.replace(comment.clone());
        tracing::info!(comment_id = id, "Updated comment");

        if let Some(previous) = previous_image
            && comment.image_url.as_deref() != Some(previous.as_str())
        {
            self.images.delete(&self.bucket, &previous).await;
        }
        Ok(comment)
    }

    /// Deletes comment `id` and, best-effort, its image.
    pub async fn delete(&self, id: CommentId) -> Result<()> {
        let _posting = InFlight::acquire(&self.posting, OPERATION)?;

        let image_url = self.lookup(id).await?.and_then(|comment| comment.image_url);

        self.table
            .delete(Comment::TABLE, &Filter::eq("id", id))
            .await?;

        self.thread.write().await.comments.remove(id);
        tracing::info!(comment_id = id, "Deleted comment");

        if let Some(url) = image_url {
            self.images.delete(&self.bucket, &url).await;
        }
        Ok(())
    }

    async fn lookup(&self, id: CommentId) -> Result<Option<Comment>> {
        if let Some(comment) = self.thread.read().await.comments.get(id) {
            return Ok(Some(comment.clone()));
        }
        fetch_by_id::<Comment>(self.table.as_ref(), id).await
    }
}

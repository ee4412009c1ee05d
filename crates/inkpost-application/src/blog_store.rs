//! Blog entity store.

use inkpost_core::blog::{Blog, BlogId, BlogPatch, NewBlog};
use inkpost_core::entity::Entity;
use inkpost_core::error::{InkpostError, Result};
use inkpost_core::gateway::{Filter, Order, Query, TableGateway};
use inkpost_core::image::{ImageChange, ImageSource};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::RwLock;

use crate::collection::{Direction, SortedCollection, decode_rows, fetch_by_id, single_row};
use crate::image_attachments::ImageAttachments;
use crate::in_flight::InFlight;

const KEY_PREFIX: &str = "blog";
const OPERATION: &str = "blog mutation";

/// In-memory mirror of the `blogs` table, newest first.
///
/// # Consistency
///
/// The local collection changes only after the gateway confirmed an
/// operation. Failures are returned as is and leave it untouched. Fetches
/// are tagged with a generation so a response that was overtaken by a
/// newer `fetch_all` is dropped.
///
/// # Concurrency
///
/// The collection sits behind a `tokio::sync::RwLock` that is never held
/// across a gateway call. Mutations share one `posting` gate; a second
/// mutation while one is running fails with `Busy`.
pub struct BlogStore {
    table: Arc<dyn TableGateway>,
    images: ImageAttachments,
    bucket: String,
    blogs: RwLock<SortedCollection<Blog>>,
    loading: AtomicBool,
    posting: AtomicBool,
    generation: AtomicU64,
}

impl BlogStore {
    /// Creates an empty store. Images go to `bucket`.
    pub fn new(
        table: Arc<dyn TableGateway>,
        images: ImageAttachments,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            table,
            images,
            bucket: bucket.into(),
            blogs: RwLock::new(SortedCollection::new(Direction::NewestFirst)),
            loading: AtomicBool::new(false),
            posting: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }

    /// Snapshot of the local collection.
    pub async fn blogs(&self) -> Vec<Blog> {
        self.blogs.read().await.items().to_vec()
    }

    pub async fn len(&self) -> usize {
        self.blogs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    pub fn is_posting(&self) -> bool {
        self.posting.load(Ordering::Acquire)
    }

    /// Blogs on the 1-based `page`.
    pub async fn page(&self, page: usize, per_page: usize) -> Vec<Blog> {
        self.blogs.read().await.page(page, per_page).to_vec()
    }

    pub async fn page_count(&self, per_page: usize) -> usize {
        self.blogs.read().await.page_count(per_page)
    }

    /// Reloads every blog, newest first.
    ///
    /// On success the local collection is replaced, unless a later fetch
    /// was started meanwhile. Returns the fetched blogs either way.
    pub async fn fetch_all(&self) -> Result<Vec<Blog>> {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.loading.store(true, Ordering::Release);

        let result = self
            .table
            .select(
                Blog::TABLE,
                &Query::new().order(Order::descending("created_at")),
            )
            .await
            .and_then(decode_rows::<Blog>);

        let latest = self.generation.load(Ordering::Acquire) == generation;
        if latest {
            self.loading.store(false, Ordering::Release);
        }

        let blogs = result?;
        if latest {
            self.blogs.write().await.replace_all(blogs.clone());
            tracing::debug!(count = blogs.len(), "Fetched blogs");
        } else {
            tracing::debug!(generation, "Discarding superseded blog fetch");
        }
        Ok(blogs)
    }

    /// Returns the local blog with `id`, or reads it from the backend
    /// without adding it to the collection.
    pub async fn find(&self, id: BlogId) -> Result<Blog> {
        if let Some(blog) = self.blogs.read().await.get(id) {
            return Ok(blog.clone());
        }
        fetch_by_id::<Blog>(self.table.as_ref(), id)
            .await?
            .ok_or_else(|| InkpostError::not_found(Blog::ENTITY_TYPE, id))
    }

    /// Publishes a new blog and places it at the front of the collection.
    pub async fn create(&self, new_blog: NewBlog) -> Result<Blog> {
        let owner_id = new_blog.validate()?;
        let _posting = InFlight::acquire(&self.posting, OPERATION)?;

        let (image_url, uploaded) = match &new_blog.image {
            None => (None, false),
            Some(ImageSource::Reference(url)) => (Some(url.clone()), false),
            Some(ImageSource::Upload(file)) => {
                let url = self.images.upload(&self.bucket, KEY_PREFIX, file).await?;
                (Some(url), true)
            }
        };

        let row = new_blog.to_row(owner_id, image_url.clone());
        let inserted = match self.table.insert(Blog::TABLE, vec![row]).await {
            Ok(rows) => decode_rows::<Blog>(rows).and_then(|blogs| {
                blogs
                    .into_iter()
                    .next()
                    .ok_or_else(|| InkpostError::gateway("Insert returned no blog"))
            }),
            Err(e) => Err(e),
        };

        let blog = match inserted {
            Ok(blog) => blog,
            Err(e) => {
                if let (true, Some(url)) = (uploaded, image_url.as_deref()) {
                    self.images.delete(&self.bucket, url).await;
                }
                return Err(e);
            }
        };

        self.blogs.write().await.insert_created(blog.clone());
        tracing::info!(blog_id = blog.id, "Created blog");
        Ok(blog)
    }

    /// Applies `patch` to blog `id` and replaces the local entry in place.
    ///
    /// A replaced or removed image is deleted from storage after the row
    /// update succeeded; that deletion never fails the update.
    pub async fn update(&self, id: BlogId, patch: BlogPatch) -> Result<Blog> {
        patch.validate()?;
        let _posting = InFlight::acquire(&self.posting, OPERATION)?;

        let previous_image = match patch.image {
            ImageChange::Keep => None,
            _ => self.lookup(id).await?.and_then(|blog| blog.image_url),
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
            .update(Blog::TABLE, &Filter::eq("id", id), patch.to_row(image_url.clone()))
            .await
        {
            Ok(rows) => single_row::<Blog>(rows, id),
            Err(e) => Err(e),
        };

        let blog = match updated {
            Ok(blog) => blog,
            Err(e) => {
                if let Some(Some(url)) = &image_url {
                    self.images.delete(&self.bucket, url).await;
                }
                return Err(e);
            }
        };

        self.blogs.write().await.replace(blog.clone());
        tracing::info!(blog_id = id, "Updated blog");

        if let Some(previous) = previous_image
            && blog.image_url.as_deref() != Some(previous.as_str())
        {
            self.images.delete(&self.bucket, &previous).await;
        }
        Ok(blog)
    }

    /// Deletes blog `id` and, best-effort, its image.
    pub async fn delete(&self, id: BlogId) -> Result<()> {
        let _posting = InFlight::acquire(&self.posting, OPERATION)?;

        let image_url = self.lookup(id).await?.and_then(|blog| blog.image_url);

        self.table
            .delete(Blog::TABLE, &Filter::eq("id", id))
            .await?;

        self.blogs.write().await.remove(id);
        tracing::info!(blog_id = id, "Deleted blog");

        if let Some(url) = image_url {
            self.images.delete(&self.bucket, &url).await;
        }
        Ok(())
    }

    /// Local entry if present, otherwise the backend row.
    async fn lookup(&self, id: BlogId) -> Result<Option<Blog>> {
        if let Some(blog) = self.blogs.read().await.get(id) {
            return Ok(Some(blog.clone()));
        }
        fetch_by_id::<Blog>(self.table.as_ref(), id).await
    }
}

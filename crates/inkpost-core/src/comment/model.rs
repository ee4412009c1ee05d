//! Comment domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::blog::BlogId;
use crate::entity::Entity;
use crate::error::{InkpostError, Result};
use crate::image::{ImageChange, ImageFile};

pub type CommentId = i64;

/// A comment as stored in the `comments` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    /// Parent blog, immutable after creation.
    pub blog_id: BlogId,
    pub content: String,
    pub user_id: String,
    pub user_name: String,
    #[serde(with = "crate::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Entity for Comment {
    const ENTITY_TYPE: &'static str = "comment";
    const TABLE: &'static str = "comments";

    fn id(&self) -> i64 {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn owner_id(&self) -> &str {
        &self.user_id
    }

    fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }
}

/// Input of `CommentStore::create`.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub blog_id: BlogId,
    pub content: String,
    pub owner_id: Option<String>,
    pub owner_name: String,
    pub image: Option<ImageFile>,
}

impl NewComment {
    /// Checks local preconditions and returns the owner id.
    pub fn validate(&self) -> Result<&str> {
        let owner_id = self
            .owner_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| InkpostError::validation("User not logged in"))?;

        if self.content.trim().is_empty() {
            return Err(InkpostError::validation("Comment content required"));
        }

        Ok(owner_id)
    }

    pub fn to_row(&self, owner_id: &str, image_url: Option<String>) -> Value {
        serde_json::json!({
            "blog_id": self.blog_id,
            "content": self.content,
            "user_id": owner_id,
            "user_name": self.owner_name,
            "image_url": image_url,
        })
    }
}

/// Input of `CommentStore::update`.
#[derive(Debug, Clone, Default)]
pub struct CommentPatch {
    pub content: Option<String>,
    pub image: ImageChange,
}

impl CommentPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn remove_image(mut self) -> Self {
        self.image = ImageChange::Remove;
        self
    }

    pub fn replace_image(mut self, file: ImageFile) -> Self {
        self.image = ImageChange::Replace(file);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.image.is_keep()
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(InkpostError::validation("Nothing to update"));
        }
        if self.content.as_ref().is_some_and(|c| c.trim().is_empty()) {
            return Err(InkpostError::validation("Comment content required"));
        }
        Ok(())
    }

    pub fn to_row(&self, image_url: Option<Option<String>>) -> Value {
        let mut row = Map::new();
        if let Some(content) = &self.content {
            row.insert("content".to_string(), Value::String(content.clone()));
        }
        if let Some(image_url) = image_url {
            row.insert(
                "image_url".to_string(),
                image_url.map(Value::String).unwrap_or(Value::Null),
            );
        }
        Value::Object(row)
    }
}

//! Blog domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::entity::Entity;
use crate::error::{InkpostError, Result};
use crate::image::{ImageChange, ImageFile, ImageSource};

pub type BlogId = i64;

/// A blog post as stored in the `blogs` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blog {
    pub id: BlogId,
    pub title: String,
    pub content: String,
    /// Owning user, immutable after creation.
    pub user_id: String,
    /// Display name of the owner at posting time.
    pub user_name: String,
    #[serde(with = "crate::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Entity for Blog {
    const ENTITY_TYPE: &'static str = "blog";
    const TABLE: &'static str = "blogs";

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

/// Input of `BlogStore::create`.
#[derive(Debug, Clone)]
pub struct NewBlog {
    pub title: String,
    pub content: String,
    /// `None` when nobody is signed in.
    pub owner_id: Option<String>,
    pub owner_name: String,
    pub image: Option<ImageSource>,
}

impl NewBlog {
    /// Checks local preconditions and returns the owner id.
    pub fn validate(&self) -> Result<&str> {
        let owner_id = self
            .owner_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| InkpostError::validation("User not logged in"))?;

        if self.title.trim().is_empty() || self.content.trim().is_empty() {
            return Err(InkpostError::validation("Title and content required"));
        }

        Ok(owner_id)
    }

    /// Row to insert once the image (if any) is resolved to a reference.
    pub fn to_row(&self, owner_id: &str, image_url: Option<String>) -> Value {
        serde_json::json!({
            "title": self.title,
            "content": self.content,
            "user_id": owner_id,
            "user_name": self.owner_name,
            "image_url": image_url,
        })
    }
}

/// Input of `BlogStore::update`. Absent fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct BlogPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub image: ImageChange,
}

impl BlogPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
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
        self.title.is_none() && self.content.is_none() && self.image.is_keep()
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(InkpostError::validation("Nothing to update"));
        }
        let blank = |field: &Option<String>| field.as_ref().is_some_and(|v| v.trim().is_empty());
        if blank(&self.title) || blank(&self.content) {
            return Err(InkpostError::validation("Title and content required"));
        }
        Ok(())
    }

    /// Column patch sent to the table API.
    ///
    /// `image_url` is `Some(None)` when the image is removed and
    /// `Some(Some(url))` when it was replaced by a freshly uploaded file.
    pub fn to_row(&self, image_url: Option<Option<String>>) -> Value {
        let mut row = Map::new();
        if let Some(title) = &self.title {
            row.insert("title".to_string(), Value::String(title.clone()));
        }
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn new_blog(owner: Option<&str>) -> NewBlog {
        NewBlog {
            title: "T".to_string(),
            content: "C".to_string(),
            owner_id: owner.map(str::to_string),
            owner_name: "Ada".to_string(),
            image: None,
        }
    }

    #[test]
    fn test_validate_requires_owner() {
        let err = new_blog(None).validate().unwrap_err();
        assert!(err.is_validation());
        assert_eq!(new_blog(Some("u-1")).validate().unwrap(), "u-1");
    }

    #[test]
    fn test_validate_requires_title_and_content() {
        let mut blog = new_blog(Some("u-1"));
        blog.title = "   ".to_string();
        assert!(blog.validate().unwrap_err().is_validation());
    }

    #[test]
    fn test_deserialize_row() {
        let row = json!({
            "id": 12,
            "title": "Hello",
            "content": "World",
            "user_id": "u-1",
            "user_name": "Ada",
            "created_at": "2024-03-01T08:00:00.123456+00:00",
            "image_url": null
        });
        let blog: Blog = serde_json::from_value(row).unwrap();
        assert_eq!(blog.id, 12);
        assert_eq!(blog.image_url, None);
        assert!(blog.is_owned_by("u-1"));
        assert!(!blog.is_owned_by("u-2"));
    }

    #[test]
    fn test_patch_row_only_contains_changed_fields() {
        let patch = BlogPatch::new().title("New");
        assert_eq!(patch.to_row(None), json!({ "title": "New" }));

        let removal = BlogPatch::new().remove_image();
        assert_eq!(removal.to_row(Some(None)), json!({ "image_url": null }));
    }

    #[test]
    fn test_empty_patch_is_rejected() {
        assert!(BlogPatch::new().validate().unwrap_err().is_validation());
        assert!(BlogPatch::new().content("").validate().is_err());
        assert!(BlogPatch::new().content("x").validate().is_ok());
    }
}

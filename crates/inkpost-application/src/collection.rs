//! Ordered local mirror of a remote collection.

use inkpost_core::entity::Entity;
use inkpost_core::error::{InkpostError, Result};
use inkpost_core::gateway::{Filter, Query, TableGateway};
use serde_json::Value;

/// Sort direction by `created_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    /// Most recent first (blogs).
    NewestFirst,
    /// Oldest first, chat-like (comments).
    OldestFirst,
}

/// Entities kept sorted by creation time.
///
/// The collection is only ever replaced wholesale by a fetch or patched by
/// a single successful mutation; no method leaves it partially updated.
#[derive(Debug, Clone)]
pub(crate) struct SortedCollection<T: Entity> {
    items: Vec<T>,
    direction: Direction,
}

impl<T: Entity> SortedCollection<T> {
    pub fn new(direction: Direction) -> Self {
        Self {
            items: Vec::new(),
            direction,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn get(&self, id: i64) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Replaces everything with the rows of a fetch, already ordered by
    /// the backend.
    pub fn replace_all(&mut self, items: Vec<T>) {
        self.items = items;
    }

    /// Places a freshly created entity.
    ///
    /// Normally this is the front (newest first) or back (oldest first).
    /// If the server timestamp would break the order, the entity goes to
    /// its sorted position instead.
    pub fn insert_created(&mut self, item: T) {
        let created_at = item.created_at();
        match self.direction {
            Direction::NewestFirst => {
                if self.items.first().is_none_or(|f| created_at >= f.created_at()) {
                    self.items.insert(0, item);
                } else {
                    let at = self.items.partition_point(|e| e.created_at() > created_at);
                    self.items.insert(at, item);
                }
            }
            Direction::OldestFirst => {
                if self.items.last().is_none_or(|l| created_at >= l.created_at()) {
                    self.items.push(item);
                } else {
                    let at = self.items.partition_point(|e| e.created_at() <= created_at);
                    self.items.insert(at, item);
                }
            }
        }
    }

    /// Replaces the entity with the same id in place. Returns `false`
    /// when the id is not present locally.
    pub fn replace(&mut self, item: T) -> bool {
        match self.items.iter_mut().find(|e| e.id() == item.id()) {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: i64) -> Option<T> {
        let index = self.items.iter().position(|e| e.id() == id)?;
        Some(self.items.remove(index))
    }

    /// 1-based page of `per_page` entities. Page 0 is treated as page 1.
    pub fn page(&self, page: usize, per_page: usize) -> &[T] {
        if per_page == 0 {
            return &[];
        }
        let start = page.saturating_sub(1).saturating_mul(per_page);
        if start >= self.items.len() {
            return &[];
        }
        let end = (start + per_page).min(self.items.len());
        &self.items[start..end]
    }

    pub fn page_count(&self, per_page: usize) -> usize {
        if per_page == 0 {
            return 0;
        }
        self.items.len().div_ceil(per_page)
    }
}

/// Decodes rows returned by the table API.
pub(crate) fn decode_rows<T: Entity>(rows: Vec<Value>) -> Result<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(InkpostError::from))
        .collect()
}

/// Reads one row by id straight from the backend.
pub(crate) async fn fetch_by_id<T: Entity>(table: &dyn TableGateway, id: i64) -> Result<Option<T>> {
    let rows = table
        .select(T::TABLE, &Query::new().filter(Filter::eq("id", id)))
        .await?;
    Ok(decode_rows(rows)?.into_iter().next())
}

/// Decodes the single row a mutation returned; an empty result means the
/// backend matched nothing.
pub(crate) fn single_row<T: Entity>(rows: Vec<Value>, id: impl ToString) -> Result<T> {
    match rows.into_iter().next() {
        Some(row) => Ok(serde_json::from_value(row)?),
        None => Err(InkpostError::not_found(T::ENTITY_TYPE, id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use inkpost_core::blog::Blog;

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn blog(id: i64, minutes: i64) -> Blog {
        Blog {
            id,
            title: format!("t{id}"),
            content: "c".to_string(),
            user_id: "u-1".to_string(),
            user_name: "Ada".to_string(),
            created_at: at(minutes),
            image_url: None,
        }
    }

    fn ids(collection: &SortedCollection<Blog>) -> Vec<i64> {
        collection.items().iter().map(|b| b.id).collect()
    }

    #[test]
    fn test_newest_first_insert_goes_to_front() {
        let mut collection = SortedCollection::new(Direction::NewestFirst);
        collection.replace_all(vec![blog(2, 20), blog(1, 10)]);

        collection.insert_created(blog(3, 30));

        assert_eq!(ids(&collection), vec![3, 2, 1]);
    }

    #[test]
    fn test_skewed_timestamp_is_reconciled() {
        let mut collection = SortedCollection::new(Direction::NewestFirst);
        collection.replace_all(vec![blog(2, 20), blog(1, 10)]);

        collection.insert_created(blog(3, 15));

        assert_eq!(ids(&collection), vec![2, 3, 1]);
    }

    #[test]
    fn test_oldest_first_insert_goes_to_back() {
        let mut collection = SortedCollection::new(Direction::OldestFirst);
        collection.replace_all(vec![blog(1, 10), blog(2, 20)]);

        collection.insert_created(blog(3, 30));
        collection.insert_created(blog(4, 15));

        assert_eq!(ids(&collection), vec![1, 4, 2, 3]);
    }

    #[test]
    fn test_replace_and_remove() {
        let mut collection = SortedCollection::new(Direction::NewestFirst);
        collection.replace_all(vec![blog(2, 20), blog(1, 10)]);

        let mut edited = blog(1, 10);
        edited.title = "edited".to_string();
        assert!(collection.replace(edited));
        assert!(!collection.replace(blog(9, 0)));
        assert_eq!(collection.get(1).map(|b| b.title.as_str()), Some("edited"));
        assert_eq!(ids(&collection), vec![2, 1]);

        assert_eq!(collection.remove(2).map(|b| b.id), Some(2));
        assert_eq!(collection.remove(2), None);
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn test_paging() {
        let mut collection = SortedCollection::new(Direction::NewestFirst);
        collection.replace_all((1..=7).rev().map(|i| blog(i, i)).collect());

        assert_eq!(collection.page_count(5), 2);
        assert_eq!(collection.page(1, 5).len(), 5);
        assert_eq!(collection.page(0, 5).len(), 5);
        assert_eq!(collection.page(2, 5).iter().map(|b| b.id).collect::<Vec<_>>(), vec![2, 1]);
        assert!(collection.page(3, 5).is_empty());
        assert!(collection.page(1, 0).is_empty());
    }
}

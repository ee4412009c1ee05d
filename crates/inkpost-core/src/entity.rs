//! Common shape of the remote collections mirrored by the stores.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// A row of a remote table that a store keeps an ordered local copy of.
///
/// Identifiers are assigned by the backend; `created_at` is the backend's
/// insert time and is the only ordering key. Rows whose `created_at` is
/// null are decoded with the Unix epoch and therefore sort as the oldest.
pub trait Entity: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Human-readable entity name used in errors and logs.
    const ENTITY_TYPE: &'static str;
    /// Remote table the entity lives in.
    const TABLE: &'static str;

    fn id(&self) -> i64;

    fn created_at(&self) -> DateTime<Utc>;

    fn owner_id(&self) -> &str;

    fn image_url(&self) -> Option<&str>;

    /// Only the owning user may edit or delete an entity.
    fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id() == user_id
    }
}

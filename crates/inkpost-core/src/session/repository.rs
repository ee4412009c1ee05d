//! Session persistence contracts.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::error::Result;
use crate::session::AuthSession;

/// Keeps the established session between process runs.
///
/// Implementations are synchronous; the stored session is a single small
/// record.
pub trait SessionRepository: Send + Sync {
    /// Returns the stored session, `None` when there is none or it expired.
    fn load(&self) -> Result<Option<AuthSession>>;

    fn save(&self, session: &AuthSession) -> Result<()>;

    /// Removes the stored session. Succeeds when nothing is stored.
    fn clear(&self) -> Result<()>;
}

/// Keeps the wall-clock time of each user's last comment post, so the
/// comment cooldown survives process restarts.
pub trait CooldownRepository: Send + Sync {
    /// Returns the last recorded post time per user id.
    fn load(&self) -> Result<HashMap<String, DateTime<Utc>>>;

    /// Records that `user_id` posted at `at`.
    fn record(&self, user_id: &str, at: DateTime<Utc>) -> Result<()>;
}

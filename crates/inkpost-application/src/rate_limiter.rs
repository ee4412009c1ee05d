//! Per-user cooldown between comment posts.

use chrono::Utc;
use inkpost_core::error::{InkpostError, Result};
use inkpost_core::session::CooldownRepository;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Advisory cooldown keyed by user id.
///
/// Only successful posts are recorded, so a failed attempt never starts
/// a cooldown. A zero cooldown disables the limiter. With a
/// `CooldownRepository` attached, recorded posts outlive the process.
pub struct CommentRateLimiter {
    cooldown: Duration,
    last_post: Mutex<HashMap<String, Instant>>,
    repository: Option<Arc<dyn CooldownRepository>>,
}

impl CommentRateLimiter {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_post: Mutex::new(HashMap::new()),
            repository: None,
        }
    }

    /// Seeds the limiter from `repository` and records future posts there.
    ///
    /// Entries whose cooldown already ran out are ignored. An unreadable
    /// repository is logged and treated as empty.
    pub fn with_repository(mut self, repository: Arc<dyn CooldownRepository>) -> Self {
        match repository.load() {
            Ok(entries) => {
                let now = Utc::now();
                let instant_now = Instant::now();
                if let Ok(last_post) = self.last_post.get_mut() {
                    for (user_id, at) in entries {
                        let elapsed = (now - at).to_std().unwrap_or(Duration::ZERO);
                        if elapsed >= self.cooldown {
                            continue;
                        }
                        let last = instant_now.checked_sub(elapsed).unwrap_or(instant_now);
                        last_post.insert(user_id, last);
                    }
                }
            }
            Err(e) => tracing::warn!("Ignoring unreadable comment cooldowns: {}", e),
        }
        self.repository = Some(repository);
        self
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Fails with `RateLimited` while `user_id` is still cooling down.
    pub fn check(&self, user_id: &str) -> Result<()> {
        if self.cooldown.is_zero() {
            return Ok(());
        }

        let last_post = self
            .last_post
            .lock()
            .map_err(|_| InkpostError::gateway("rate limiter state poisoned"))?;
        if let Some(last) = last_post.get(user_id) {
            let elapsed = last.elapsed();
            if elapsed < self.cooldown {
                return Err(InkpostError::RateLimited {
                    retry_after: self.cooldown - elapsed,
                });
            }
        }
        Ok(())
    }

    /// Starts the cooldown for `user_id`.
    pub fn record(&self, user_id: &str) {
        if let Ok(mut last_post) = self.last_post.lock() {
            last_post.insert(user_id.to_string(), Instant::now());
        }
        if let Some(repository) = &self.repository
            && let Err(e) = repository.record(user_id, Utc::now())
        {
            tracing::warn!(user_id, "Failed to persist comment cooldown: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    struct FixedCooldowns {
        entries: HashMap<String, DateTime<Utc>>,
        recorded: Mutex<Vec<String>>,
    }

    impl CooldownRepository for FixedCooldowns {
        fn load(&self) -> Result<HashMap<String, DateTime<Utc>>> {
            Ok(self.entries.clone())
        }

        fn record(&self, user_id: &str, _at: DateTime<Utc>) -> Result<()> {
            self.recorded.lock().unwrap().push(user_id.to_string());
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_expires() {
        let limiter = CommentRateLimiter::new(Duration::from_secs(10));
        limiter.check("u-1").unwrap();
        limiter.record("u-1");

        tokio::time::advance(Duration::from_secs(4)).await;
        match limiter.check("u-1").unwrap_err() {
            InkpostError::RateLimited { retry_after } => {
                assert_eq!(retry_after, Duration::from_secs(6));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(limiter.check("u-2").is_ok());

        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(limiter.check("u-1").is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_cooldown_never_limits() {
        let limiter = CommentRateLimiter::new(Duration::ZERO);
        limiter.record("u-1");
        assert!(limiter.check("u-1").is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_repository_seeds_and_records() {
        let now = Utc::now();
        let repository = Arc::new(FixedCooldowns {
            entries: HashMap::from([
                ("recent".to_string(), now - chrono::Duration::seconds(2)),
                ("stale".to_string(), now - chrono::Duration::minutes(5)),
            ]),
            recorded: Mutex::new(Vec::new()),
        });
        let limiter =
            CommentRateLimiter::new(Duration::from_secs(10)).with_repository(repository.clone());

        match limiter.check("recent").unwrap_err() {
            InkpostError::RateLimited { retry_after } => {
                assert!(retry_after > Duration::from_secs(7));
                assert!(retry_after <= Duration::from_secs(8));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(limiter.check("stale").is_ok());

        limiter.record("stale");
        assert_eq!(*repository.recorded.lock().unwrap(), vec!["stale".to_string()]);
    }
}

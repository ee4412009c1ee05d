use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use inkpost_application::{
    AuthService, BlogStore, CommentRateLimiter, CommentStore, ImageAttachments, SessionObserver,
};
use inkpost_infrastructure::{ConfigService, CooldownStorage, SessionStorage, SupabaseGateway};

use crate::app::AppState;

pub struct AppBootstrap {
    pub app_state: AppState,
}

impl AppBootstrap {
    /// Loads configuration, restores the stored session and builds the
    /// stores on top of the hosted backend.
    pub async fn initialize(config_path: Option<PathBuf>) -> Result<Self> {
        let config_service = match config_path {
            Some(path) => ConfigService::with_path(path),
            None => ConfigService::new()
                .map_err(|e| anyhow!("Failed to resolve config path: {}", e))?,
        };
        let config = config_service
            .get_config()
            .map_err(|e| anyhow!("Failed to load {}: {}", config_service.path().display(), e))?;

        let gateway = Arc::new(SupabaseGateway::from_settings(&config.backend)?);

        let session_storage = Arc::new(
            SessionStorage::new().map_err(|e| anyhow!("Failed to resolve session path: {}", e))?,
        );
        match session_storage.load() {
            Ok(Some(session)) => {
                tracing::debug!(user_id = %session.user.id, "Restoring stored session");
                gateway.restore_session(session);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("Ignoring unreadable session file: {}", e);
                session_storage.clear()?;
            }
        }

        let observer = SessionObserver::start(gateway.clone()).await?;

        let cooldowns = Arc::new(
            CooldownStorage::new()
                .map_err(|e| anyhow!("Failed to resolve cooldown path: {}", e))?,
        );
        let rate_limiter =
            CommentRateLimiter::new(config.comments.cooldown()).with_repository(cooldowns);

        let images = ImageAttachments::new(gateway.clone());
        let blogs = BlogStore::new(
            gateway.clone(),
            images.clone(),
            config.storage.blog_bucket.clone(),
        );
        let comments = CommentStore::new(
            gateway.clone(),
            images,
            config.storage.comment_bucket.clone(),
            rate_limiter,
        );
        let auth = AuthService::new(gateway).with_repository(session_storage);

        Ok(Self {
            app_state: AppState {
                config,
                auth,
                observer,
                blogs,
                comments,
            },
        })
    }
}

use inkpost_application::{AuthService, BlogStore, CommentStore, SessionObserver};
use inkpost_core::config::AppConfig;

/// Everything a command needs, wired once per invocation.
pub struct AppState {
    pub config: AppConfig,
    pub auth: AuthService,
    pub observer: SessionObserver,
    pub blogs: BlogStore,
    pub comments: CommentStore,
}

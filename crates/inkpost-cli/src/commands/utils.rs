use anyhow::{Context, Result, bail};
use chrono::{DateTime, Local, Utc};
use inkpost_application::Route;
use inkpost_core::entity::Entity;
use inkpost_core::image::ImageFile;
use inkpost_core::session::SessionUser;
use std::path::Path;

use crate::app::AppState;

/// Applies the route guard and returns the signed-in user.
pub fn require_user(state: &AppState, route: Route) -> Result<SessionUser> {
    let session = state.observer.current();
    if route.guard(&session) == Route::Auth {
        bail!("Not signed in. Run `inkpost auth login` first.");
    }
    session
        .user()
        .cloned()
        .context("Not signed in. Run `inkpost auth login` first.")
}

/// Rejects edits of entities owned by someone else.
pub fn ensure_owner<T: Entity>(entity: &T, user: &SessionUser) -> Result<()> {
    if !entity.is_owned_by(&user.id) {
        bail!(
            "You can only change your own {}s ({} {} belongs to someone else)",
            T::ENTITY_TYPE,
            T::ENTITY_TYPE,
            entity.id()
        );
    }
    Ok(())
}

/// Deletions need an explicit `--yes`.
pub fn ensure_confirmed(confirmed: bool, what: &str) -> Result<()> {
    if !confirmed {
        bail!("Refusing to delete {} without --yes", what);
    }
    Ok(())
}

pub async fn read_image(path: &Path) -> Result<ImageFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read image {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_string();
    Ok(ImageFile::new(file_name, bytes))
}

pub fn format_time(value: DateTime<Utc>) -> String {
    value
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

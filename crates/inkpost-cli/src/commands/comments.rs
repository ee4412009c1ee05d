use anyhow::{Context, Result};
use inkpost_application::Route;
use inkpost_core::comment::{Comment, CommentPatch, NewComment};
use inkpost_core::session::SessionUser;

use super::utils::{ensure_confirmed, ensure_owner, read_image, require_user};
use crate::CommentAction;
use crate::app::AppState;

pub async fn run(state: &AppState, action: CommentAction) -> Result<()> {
    match action {
        CommentAction::Add {
            blog_id,
            content,
            image,
        } => {
            let user = require_user(state, Route::Blog(blog_id))?;
            let image = match image {
                Some(path) => Some(read_image(&path).await?),
                None => None,
            };
            let comment = state
                .comments
                .create(NewComment {
                    blog_id,
                    content,
                    owner_id: Some(user.id),
                    owner_name: user.display_name,
                    image,
                })
                .await?;
            println!("Posted comment {} on blog {}", comment.id, blog_id);
        }
        CommentAction::Edit {
            id,
            blog_id,
            content,
            image,
            remove_image,
        } => {
            let user = require_user(state, Route::Blog(blog_id))?;
            owned_comment(state, &user, blog_id, id).await?;

            let mut patch = CommentPatch {
                content,
                ..CommentPatch::default()
            };
            if let Some(path) = image {
                patch = patch.replace_image(read_image(&path).await?);
            } else if remove_image {
                patch = patch.remove_image();
            }

            state.comments.update(id, patch).await?;
            println!("Updated comment {}", id);
        }
        CommentAction::Delete { id, blog_id, yes } => {
            let user = require_user(state, Route::Blog(blog_id))?;
            owned_comment(state, &user, blog_id, id).await?;
            ensure_confirmed(yes, &format!("comment {}", id))?;

            state.comments.delete(id).await?;
            println!("Deleted comment {}", id);
        }
    }
    Ok(())
}

/// Loads the blog's comments and returns comment `id` if `user` owns it.
async fn owned_comment(
    state: &AppState,
    user: &SessionUser,
    blog_id: i64,
    id: i64,
) -> Result<Comment> {
    let comment = state
        .comments
        .fetch_all(blog_id)
        .await?
        .into_iter()
        .find(|comment| comment.id == id)
        .with_context(|| format!("Comment {} not found on blog {}", id, blog_id))?;
    ensure_owner(&comment, user)?;
    Ok(comment)
}

use anyhow::Result;
use inkpost_application::Route;
use inkpost_core::blog::{Blog, BlogPatch, NewBlog};
use inkpost_core::image::ImageSource;

use super::utils::{ensure_confirmed, ensure_owner, format_time, read_image, require_user};
use crate::BlogAction;
use crate::app::AppState;

pub async fn run(state: &AppState, action: BlogAction) -> Result<()> {
    match action {
        BlogAction::List { page } => list(state, page).await,
        BlogAction::Show { id } => show(state, id).await,
        BlogAction::Create {
            title,
            content,
            image,
        } => {
            let user = require_user(state, Route::Home)?;
            let image = match image {
                Some(path) => Some(ImageSource::Upload(read_image(&path).await?)),
                None => None,
            };
            let blog = state
                .blogs
                .create(NewBlog {
                    title,
                    content,
                    owner_id: Some(user.id),
                    owner_name: user.display_name,
                    image,
                })
                .await?;
            println!("Published blog {}", blog.id);
            Ok(())
        }
        BlogAction::Edit {
            id,
            title,
            content,
            image,
            remove_image,
        } => {
            let user = require_user(state, Route::Blog(id))?;
            let blog = state.blogs.find(id).await?;
            ensure_owner(&blog, &user)?;

            let mut patch = BlogPatch {
                title,
                content,
                ..BlogPatch::default()
            };
            if let Some(path) = image {
                patch = patch.replace_image(read_image(&path).await?);
            } else if remove_image {
                patch = patch.remove_image();
            }

            let blog = state.blogs.update(id, patch).await?;
            println!("Updated blog {}", blog.id);
            Ok(())
        }
        BlogAction::Delete { id, yes } => {
            let user = require_user(state, Route::Blog(id))?;
            let blog = state.blogs.find(id).await?;
            ensure_owner(&blog, &user)?;
            ensure_confirmed(yes, &format!("blog {} \"{}\"", blog.id, blog.title))?;

            state.blogs.delete(id).await?;
            println!("Deleted blog {}", id);
            Ok(())
        }
    }
}

async fn list(state: &AppState, page: usize) -> Result<()> {
    require_user(state, Route::Home)?;
    let per_page = state.config.pagination.per_page;

    state.blogs.fetch_all().await?;
    let page_count = state.blogs.page_count(per_page).await;
    if page_count == 0 {
        println!("No blogs yet");
        return Ok(());
    }

    let page = page.clamp(1, page_count);
    for blog in state.blogs.page(page, per_page).await {
        print_summary(&blog);
    }
    println!("Page {}/{}", page, page_count);
    Ok(())
}

async fn show(state: &AppState, id: i64) -> Result<()> {
    require_user(state, Route::Blog(id))?;

    let blog = state.blogs.find(id).await?;
    let comments = state.comments.fetch_all(id).await?;

    println!("{}", blog.title);
    println!("by {} on {}", blog.user_name, format_time(blog.created_at));
    if let Some(url) = &blog.image_url {
        println!("image: {}", url);
    }
    println!();
    println!("{}", blog.content);
    println!();
    println!("Comments ({})", comments.len());
    for comment in comments {
        println!(
            "  #{} {} ({}): {}",
            comment.id,
            comment.user_name,
            format_time(comment.created_at),
            comment.content
        );
        if let Some(url) = &comment.image_url {
            println!("      image: {}", url);
        }
    }
    Ok(())
}

fn print_summary(blog: &Blog) {
    let image_marker = if blog.image_url.is_some() { " [image]" } else { "" };
    println!(
        "#{:<5} {}{}  - {}, {}",
        blog.id,
        blog.title,
        image_marker,
        blog.user_name,
        format_time(blog.created_at)
    );
}

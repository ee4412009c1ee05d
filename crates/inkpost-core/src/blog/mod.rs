//! Blog domain module.
//!
//! # Module Structure
//!
//! - `model`: `Blog` plus the `NewBlog` / `BlogPatch` inputs of the store

mod model;

pub use model::{Blog, BlogId, BlogPatch, NewBlog};

//! Comment domain module.
//!
//! # Module Structure
//!
//! - `model`: `Comment` plus the `NewComment` / `CommentPatch` inputs of the store

mod model;

pub use model::{Comment, CommentId, CommentPatch, NewComment};

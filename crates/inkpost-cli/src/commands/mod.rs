pub mod auth;
pub mod blogs;
pub mod comments;
mod utils;

//! Domain layer for Inkpost.
//!
//! Holds the entity models, the gateway traits that describe the hosted
//! backend, configuration types and the shared error type. Nothing in this
//! crate performs I/O.

pub mod blog;
pub mod comment;
pub mod config;
pub mod entity;
pub mod error;
pub mod gateway;
pub mod image;
pub mod session;
mod timestamp;

// Re-export common error type
pub use error::{InkpostError, Result};

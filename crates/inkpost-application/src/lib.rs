//! Application layer for Inkpost.
//!
//! Entity stores mirror the remote collections and keep them in sync with
//! the gateway; the session observer and auth service manage who is
//! signed in; navigation decides which screen an unauthenticated user may
//! see.

pub mod auth_service;
pub mod blog_store;
mod collection;
pub mod comment_store;
pub mod image_attachments;
mod in_flight;
pub mod navigation;
pub mod rate_limiter;
pub mod session;

pub use auth_service::{AuthService, SignUpOutcome};
pub use blog_store::BlogStore;
pub use comment_store::CommentStore;
pub use image_attachments::ImageAttachments;
pub use navigation::Route;
pub use rate_limiter::CommentRateLimiter;
pub use session::{SessionObserver, SessionSubscription, SessionTransition};

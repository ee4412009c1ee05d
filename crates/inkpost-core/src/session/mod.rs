//! Session domain module.
//!
//! # Module Structure
//!
//! - `model`: `AuthSession`, `SessionUser` and the two-state `SessionState`
//! - `repository`: `SessionRepository`, persistence of the established session,
//!   and `CooldownRepository`, persistence of comment cooldowns

mod model;
mod repository;

pub use model::{AuthSession, DEFAULT_DISPLAY_NAME, SessionState, SessionUser};
pub use repository::{CooldownRepository, SessionRepository};

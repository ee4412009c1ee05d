//! Session observation.
//!
//! # Module Structure
//!
//! - `observer`: `SessionObserver`, the explicitly started owner of the
//!   client's session state, and its `SessionSubscription`s

mod observer;

pub use observer::{SessionObserver, SessionSubscription, SessionTransition};

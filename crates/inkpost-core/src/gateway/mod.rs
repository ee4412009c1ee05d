//! Gateway traits describing the hosted backend.
//!
//! The backend offers three services: a row-oriented table API, a blob
//! store with public bucket URLs, and password authentication. Each is a
//! separate trait so stores only depend on what they use.
//!
//! # Module Structure
//!
//! - `table`: `TableGateway` with `Query`, `Filter` and `Order`
//! - `storage`: `StorageGateway` and `UploadOptions`
//! - `auth`: `AuthGateway` and `SignUpProfile`

mod auth;
mod storage;
mod table;

pub use auth::{AuthGateway, SessionChanges, SignUpProfile};
pub use storage::{StorageGateway, UploadOptions};
pub use table::{Filter, Order, Query, TableGateway};

/// A backend that offers all three services.
pub trait RemoteGateway: TableGateway + StorageGateway + AuthGateway {}

impl<T> RemoteGateway for T where T: TableGateway + StorageGateway + AuthGateway {}

pub mod config_service;
pub mod memory_gateway;
pub mod paths;
pub mod session_listeners;
pub mod storage;
pub mod supabase;

pub use crate::config_service::ConfigService;
pub use crate::memory_gateway::{FailPoint, MemoryGateway};
pub use crate::paths::InkpostPaths;
pub use crate::storage::{CooldownStorage, SessionStorage};
pub use crate::supabase::SupabaseGateway;

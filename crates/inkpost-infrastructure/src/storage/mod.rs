pub mod cooldown_storage;
pub mod session_storage;

pub use cooldown_storage::CooldownStorage;
pub use session_storage::SessionStorage;

mod bootstrap;
mod state;

pub use bootstrap::AppBootstrap;
pub use state::AppState;

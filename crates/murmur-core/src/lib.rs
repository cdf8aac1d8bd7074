pub mod api;
pub mod bus;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod realtime;
pub mod search;
pub mod session;
pub mod store;
pub mod threads;

// Re-export the main entry points at crate root for convenience
pub use bus::InvalidationBus;
pub use error::ChatError;
pub use session::ChatSession;

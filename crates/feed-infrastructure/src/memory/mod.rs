//! In-memory adapters for development and tests

pub mod content_store;
pub mod session_store;

pub use content_store::InMemoryContentStore;
pub use session_store::InMemorySessionStore;

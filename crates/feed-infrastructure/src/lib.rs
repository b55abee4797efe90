//! # Feed Infrastructure
//!
//! Storage implementations (adapters): PostgreSQL via sqlx, and in-memory stores.

pub mod database;
pub mod memory;

pub use database::{create_pool, run_migrations, PgContentRepository, PgSessionRepository};
pub use memory::{InMemoryContentStore, InMemorySessionStore};

//! PostgreSQL repository implementations

pub mod session_repo_impl;
pub mod content_repo_impl;

pub use session_repo_impl::PgSessionRepository;
pub use content_repo_impl::PgContentRepository;

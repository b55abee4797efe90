//! Repository traits (ports)

pub mod session_repository;
pub mod content_repository;

pub use session_repository::{SessionRepository, ViewRepository};
pub use content_repository::ContentRepository;

#[cfg(test)]
pub use session_repository::{MockSessionRepository, MockViewRepository};
#[cfg(test)]
pub use content_repository::MockContentRepository;

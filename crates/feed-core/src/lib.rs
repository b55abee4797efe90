//! # Feed Core
//!
//! Domain entities, repository traits, and the session-scoped infinite feed engine.

pub mod clock;
pub mod domain;
pub mod services;
pub mod repositories;
pub mod error;

// Re-export domain entities
pub use clock::{Clock, ManualClock, SystemClock};
pub use domain::*;
pub use error::DomainError;

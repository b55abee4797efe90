//! # Feed Core - Services Module
//!
//! Session lifecycle and feed assembly.

pub mod balancer;
pub mod cleanup_job;
pub mod cursor;
pub mod cycle;
pub mod feed_service;
pub mod session_service;
pub mod view_tracker;

pub use balancer::ChannelBalancer;
pub use cleanup_job::{CleanupRun, SessionCleanupJob};
pub use cursor::FeedCursor;
pub use cycle::{CycleDecision, CycleManager, CycleOutcome};
pub use feed_service::FeedService;
pub use session_service::SessionService;
pub use view_tracker::ViewTracker;

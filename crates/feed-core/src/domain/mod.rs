//! # Feed Core - Domain Module
//!
//! Domain entities for the feed engine.

pub mod session;
pub mod content_item;
pub mod feed;

// Re-export all entities
pub use session::{CleanupReport, Session, SessionPolicy, SessionStart, SessionStats};
pub use content_item::{ContentItem, ContentQuery, FeedPosition, FeedScope, Watermark};
pub use feed::{ChannelFeedRequest, ContentBatch, HomeFeedRequest};

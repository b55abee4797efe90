//! Application-wide constants

/// Sliding inactivity window of a session.
pub const SESSION_TTL_MINUTES: i64 = 15;
/// How long an expired session is kept before it is hard-deleted.
pub const SESSION_RETENTION_HOURS: i64 = 24;
pub const SESSION_CLEANUP_INTERVAL_SECS: u64 = 600;

pub const DEFAULT_FEED_LIMIT: usize = 20;
pub const MIN_FEED_LIMIT: usize = 1;
pub const MAX_FEED_LIMIT: usize = 100;

pub const DEFAULT_MAX_CONSECUTIVE: usize = 5;
pub const MIN_MAX_CONSECUTIVE: usize = 1;
pub const MAX_MAX_CONSECUTIVE: usize = 10;

pub const MAX_MARK_VIEWED_BATCH: usize = 200;

/// Channel assigned to items that carry no channel tag.
pub const UNKNOWN_CHANNEL: &str = "unknown";

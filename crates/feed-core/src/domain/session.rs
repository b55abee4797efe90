// ============================================================================
// Feed Core - Session Entity
// File: crates/feed-core/src/domain/session.rs
// Description: Anonymous client session with a sliding inactivity window
// ============================================================================

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use feed_shared::constants::{SESSION_RETENTION_HOURS, SESSION_TTL_MINUTES};

/// TTL and retention windows applied to every session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    pub ttl: Duration,
    pub retention: Duration,
}

impl SessionPolicy {
    pub fn new(ttl: Duration, retention: Duration) -> Self {
        Self { ttl, retention }
    }

    pub fn from_minutes_and_hours(ttl_minutes: i64, retention_hours: i64) -> Self {
        Self::new(Duration::minutes(ttl_minutes), Duration::hours(retention_hours))
    }
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self::from_minutes_and_hours(SESSION_TTL_MINUTES, SESSION_RETENTION_HOURS)
    }
}

/// Session entity (user_sessions row)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: Uuid,
    pub device_fingerprint: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
}

impl Session {
    pub fn new(device_fingerprint: Option<String>, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            device_fingerprint: device_fingerprint.filter(|f| !f.trim().is_empty()),
            created_at: now,
            last_activity: now,
            expires_at: now + ttl,
            is_active: true,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Active and inside its TTL window.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.is_active && !self.is_expired(now)
    }

    /// Push the window forward. Never moves either timestamp backwards.
    pub fn extend(&mut self, now: DateTime<Utc>, ttl: Duration) {
        self.last_activity = self.last_activity.max(now);
        self.expires_at = self.expires_at.max(now + ttl);
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.created_at
    }
}

/// Per-session usage summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub total_viewed: u64,
    pub session_age_minutes: i64,
    pub is_active: bool,
}

/// Outcome of a start request
#[derive(Debug, Clone)]
pub struct SessionStart {
    pub session: Session,
    pub is_new: bool,
}

/// Row counts from one cleanup sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub deactivated: u64,
    pub deleted: u64,
}

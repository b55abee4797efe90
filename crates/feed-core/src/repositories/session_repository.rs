//! Session and session-view repository traits (ports)

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::Session;
use crate::error::DomainError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create(&self, session: &Session) -> Result<Session, DomainError>;
    async fn find_by_id(&self, session_id: &Uuid) -> Result<Option<Session>, DomainError>;

    /// Push `last_activity`/`expires_at` forward on a session that is active and
    /// not expired at `now`. Both columns only ever grow. `None` when no such row.
    async fn touch(
        &self,
        session_id: &Uuid,
        now: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<Session>, DomainError>;

    async fn deactivate(&self, session_id: &Uuid) -> Result<(), DomainError>;

    /// Mark every active session with `expires_at < now` inactive.
    async fn deactivate_expired(&self, now: DateTime<Utc>) -> Result<u64, DomainError>;

    /// Hard-delete sessions with `expires_at < cutoff`, views cascade.
    async fn delete_expired_before(&self, cutoff: DateTime<Utc>) -> Result<u64, DomainError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ViewRepository: Send + Sync {
    /// Insert missing (session, item) pairs. Returns the number of new rows.
    async fn insert_views(
        &self,
        session_id: &Uuid,
        item_ids: &[String],
        viewed_at: DateTime<Utc>,
    ) -> Result<u64, DomainError>;

    async fn viewed_item_ids(&self, session_id: &Uuid) -> Result<HashSet<String>, DomainError>;
    async fn count_views(&self, session_id: &Uuid) -> Result<u64, DomainError>;
}

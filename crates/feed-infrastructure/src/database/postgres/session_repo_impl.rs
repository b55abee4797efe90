// ============================================================================
// Feed Infrastructure - PostgreSQL Session Repository
// File: crates/feed-infrastructure/src/database/postgres/session_repo_impl.rs
// ============================================================================

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::{debug, error};
use uuid::Uuid;

use feed_core::domain::Session;
use feed_core::error::DomainError;
use feed_core::repositories::{SessionRepository, ViewRepository};

/// Backs both `user_sessions` and `session_views`.
pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal row type for SQLx mapping
#[derive(Debug, FromRow)]
struct SessionRow {
    pub session_id: Uuid,
    pub device_fingerprint: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Session {
            session_id: row.session_id,
            device_fingerprint: row.device_fingerprint,
            created_at: row.created_at,
            last_activity: row.last_activity,
            expires_at: row.expires_at,
            is_active: row.is_active,
        }
    }
}

fn storage_error(context: &str, e: sqlx::Error) -> DomainError {
    error!("Database error {}: {}", context, e);
    DomainError::StorageError(e.to_string())
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn create(&self, session: &Session) -> Result<Session, DomainError> {
        let row: SessionRow = sqlx::query_as(
            r#"
            INSERT INTO user_sessions (
                session_id, device_fingerprint, created_at, last_activity, expires_at, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING session_id, device_fingerprint, created_at, last_activity, expires_at, is_active
            "#,
        )
        .bind(session.session_id)
        .bind(&session.device_fingerprint)
        .bind(session.created_at)
        .bind(session.last_activity)
        .bind(session.expires_at)
        .bind(session.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| storage_error("creating session", e))?;

        Ok(row.into())
    }

    async fn find_by_id(&self, session_id: &Uuid) -> Result<Option<Session>, DomainError> {
        let row: Option<SessionRow> = sqlx::query_as(
            r#"
            SELECT session_id, device_fingerprint, created_at, last_activity, expires_at, is_active
            FROM user_sessions
            WHERE session_id = $1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("finding session", e))?;

        Ok(row.map(|r| r.into()))
    }

    async fn touch(
        &self,
        session_id: &Uuid,
        now: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<Session>, DomainError> {
        // GREATEST keeps concurrent extends last-write-wins safe.
        let row: Option<SessionRow> = sqlx::query_as(
            r#"
            UPDATE user_sessions
            SET last_activity = GREATEST(last_activity, $2),
                expires_at = GREATEST(expires_at, $3)
            WHERE session_id = $1
              AND is_active = TRUE
              AND expires_at >= $2
            RETURNING session_id, device_fingerprint, created_at, last_activity, expires_at, is_active
            "#,
        )
        .bind(session_id)
        .bind(now)
        .bind(expires_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("extending session", e))?;

        Ok(row.map(|r| r.into()))
    }

    async fn deactivate(&self, session_id: &Uuid) -> Result<(), DomainError> {
        sqlx::query("UPDATE user_sessions SET is_active = FALSE WHERE session_id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("deactivating session", e))?;

        Ok(())
    }

    async fn deactivate_expired(&self, now: DateTime<Utc>) -> Result<u64, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE user_sessions
            SET is_active = FALSE
            WHERE is_active = TRUE AND expires_at < $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("deactivating expired sessions", e))?;

        Ok(result.rows_affected())
    }

    async fn delete_expired_before(&self, cutoff: DateTime<Utc>) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE expires_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("deleting expired sessions", e))?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl ViewRepository for PgSessionRepository {
    async fn insert_views(
        &self,
        session_id: &Uuid,
        item_ids: &[String],
        viewed_at: DateTime<Utc>,
    ) -> Result<u64, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO session_views (session_id, item_id, viewed_at)
            SELECT $1, UNNEST($2::text[]), $3
            ON CONFLICT (session_id, item_id) DO NOTHING
            "#,
        )
        .bind(session_id)
        .bind(item_ids)
        .bind(viewed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("inserting session views", e))?;

        debug!(
            "Inserted {} of {} view(s) for session {}",
            result.rows_affected(),
            item_ids.len(),
            session_id
        );
        Ok(result.rows_affected())
    }

    async fn viewed_item_ids(&self, session_id: &Uuid) -> Result<HashSet<String>, DomainError> {
        let ids: Vec<String> =
            sqlx::query_scalar("SELECT item_id FROM session_views WHERE session_id = $1")
                .bind(session_id)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| storage_error("loading viewed items", e))?;

        Ok(ids.into_iter().collect())
    }

    async fn count_views(&self, session_id: &Uuid) -> Result<u64, DomainError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM session_views WHERE session_id = $1")
                .bind(session_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| storage_error("counting views", e))?;

        Ok(count.max(0) as u64)
    }
}

// ============================================================================
// Feed Infrastructure - PostgreSQL Content Repository
// File: crates/feed-infrastructure/src/database/postgres/content_repo_impl.rs
// ============================================================================

use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use tracing::error;

use feed_core::domain::{ContentItem, ContentQuery};
use feed_core::error::DomainError;
use feed_core::repositories::ContentRepository;

pub struct PgContentRepository {
    pool: PgPool,
}

impl PgContentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ContentItemRow {
    pub item_id: String,
    pub title: Option<String>,
    pub content: Option<String>,
    pub link: Option<String>,
    pub pub_timestamp: i64,
    pub translations: Option<serde_json::Value>,
    pub channels: Vec<String>,
}

impl From<ContentItemRow> for ContentItem {
    fn from(row: ContentItemRow) -> Self {
        ContentItem {
            item_id: row.item_id,
            channels: row.channels,
            watermark: row.pub_timestamp,
            title: row.title,
            content: row.content,
            link: row.link,
            translations: row.translations,
        }
    }
}

#[async_trait]
impl ContentRepository for PgContentRepository {
    async fn fetch(&self, query: &ContentQuery) -> Result<Vec<ContentItem>, DomainError> {
        let exclude: Vec<String> = query.exclude.iter().cloned().collect();

        // Channel filter on the scope, but every visible channel tag is returned,
        // in tagging order so the first tag stays the primary channel.
        let rows: Vec<ContentItemRow> = sqlx::query_as(
            r#"
            SELECT
                i.item_id, i.title, i.content, i.link, i.pub_timestamp, i.translations,
                ARRAY_AGG(c.channel ORDER BY c.position, c.channel) AS channels
            FROM items i
            JOIN item_channels c ON c.item_id = i.item_id AND c.is_visible = TRUE
            WHERE ($2::bigint IS NULL OR i.pub_timestamp < $2)
              AND ($3::bigint IS NULL OR i.pub_timestamp >= $3)
              AND NOT (i.item_id = ANY($4::text[]))
              AND EXISTS (
                  SELECT 1 FROM item_channels s
                  WHERE s.item_id = i.item_id
                    AND s.is_visible = TRUE
                    AND ($1::text IS NULL OR s.channel = $1)
              )
            GROUP BY i.item_id
            ORDER BY i.pub_timestamp DESC, i.item_id DESC
            LIMIT $5
            "#,
        )
        .bind(query.scope.channel())
        .bind(query.before)
        .bind(query.floor)
        .bind(exclude)
        .bind(query.limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error fetching content: {}", e);
            DomainError::StorageError(e.to_string())
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count_in_channel(
        &self,
        channel: &str,
        exclude: &HashSet<String>,
    ) -> Result<u64, DomainError> {
        let exclude: Vec<String> = exclude.iter().cloned().collect();

        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(DISTINCT c.item_id)
            FROM item_channels c
            WHERE c.channel = $1
              AND c.is_visible = TRUE
              AND NOT (c.item_id = ANY($2::text[]))
            "#,
        )
        .bind(channel)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error counting channel {}: {}", channel, e);
            DomainError::StorageError(e.to_string())
        })?;

        Ok(count.max(0) as u64)
    }
}

//! Content store trait (port)

use std::collections::HashSet;

use async_trait::async_trait;

use crate::domain::{ContentItem, ContentQuery};
use crate::error::DomainError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Up to `query.limit` visible items matching the query, ordered
    /// `(watermark DESC, item_id DESC)`.
    async fn fetch(&self, query: &ContentQuery) -> Result<Vec<ContentItem>, DomainError>;

    /// Visible items in `channel` not in `exclude`. An empty set counts everything.
    async fn count_in_channel(
        &self,
        channel: &str,
        exclude: &HashSet<String>,
    ) -> Result<u64, DomainError>;
}

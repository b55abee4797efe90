// ============================================================================
// Feed Core - Cycle Manager
// File: crates/feed-core/src/services/cycle.rs
// Description: Recycles a channel once a session has seen most of it
// ============================================================================

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::{ContentItem, ContentQuery, FeedScope};
use crate::error::DomainError;
use crate::repositories::ContentRepository;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleDecision {
    /// Some of the channel has not been viewed yet; restart from the newest item.
    Recyclable,
    /// Every visible item in the channel has been viewed by this session.
    Exhausted,
}

impl CycleDecision {
    pub fn decide(total: u64, viewed_in_channel: u64) -> Self {
        if total > viewed_in_channel {
            CycleDecision::Recyclable
        } else {
            CycleDecision::Exhausted
        }
    }
}

/// Items appended to a short channel page
#[derive(Debug, Clone, PartialEq)]
pub struct CycleOutcome {
    pub recycled: Vec<ContentItem>,
    pub cycle_count: Option<u32>,
    pub has_more: bool,
}

impl CycleOutcome {
    fn exhausted() -> Self {
        Self {
            recycled: Vec::new(),
            cycle_count: None,
            has_more: false,
        }
    }
}

pub struct CycleManager {
    content_repo: Arc<dyn ContentRepository>,
}

impl CycleManager {
    pub fn new(content_repo: Arc<dyn ContentRepository>) -> Self {
        Self { content_repo }
    }

    /// Fill the gap between `batch` and `limit` with unviewed items from the
    /// start of the channel, ignoring the cursor. Items already in `batch` are
    /// never repeated.
    pub async fn backfill(
        &self,
        channel: &str,
        viewed: &HashSet<String>,
        batch: &[ContentItem],
        limit: usize,
    ) -> Result<CycleOutcome, DomainError> {
        let shortfall = limit.saturating_sub(batch.len());
        if shortfall == 0 {
            return Ok(CycleOutcome::exhausted());
        }

        // 1. How much of the channel has this session seen?
        let total = self.content_repo.count_in_channel(channel, &HashSet::new()).await?;
        let unseen = self.content_repo.count_in_channel(channel, viewed).await?;
        let viewed_in_channel = total.saturating_sub(unseen);

        if CycleDecision::decide(total, viewed_in_channel) == CycleDecision::Exhausted {
            debug!("Channel {} fully viewed, nothing to recycle", channel);
            return Ok(CycleOutcome::exhausted());
        }

        // 2. Restart from the newest item, skipping what this page already holds
        let mut exclude = viewed.clone();
        exclude.extend(batch.iter().map(|item| item.item_id.clone()));

        let query = ContentQuery::new(FeedScope::Channel(channel.to_string()), shortfall)
            .excluding(exclude);
        let recycled = self.content_repo.fetch(&query).await?;

        if recycled.is_empty() {
            return Ok(CycleOutcome::exhausted());
        }

        info!(
            "Recycling channel {}: {} item(s) after {}/{} viewed",
            channel,
            recycled.len(),
            viewed_in_channel,
            total
        );
        Ok(CycleOutcome {
            recycled,
            cycle_count: Some(1),
            has_more: true,
        })
    }
}

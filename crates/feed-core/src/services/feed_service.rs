// ============================================================================
// Feed Core - Feed Service
// File: crates/feed-core/src/services/feed_service.rs
// Description: Home and channel infinite feeds
// ============================================================================

use std::sync::Arc;

use tracing::{debug, info};

use feed_shared::config::FeedSettings;
use feed_shared::constants::{MAX_MAX_CONSECUTIVE, MIN_FEED_LIMIT, MIN_MAX_CONSECUTIVE};

use crate::domain::{ChannelFeedRequest, ContentBatch, ContentQuery, FeedScope, HomeFeedRequest};
use crate::error::DomainError;
use crate::repositories::ContentRepository;
use crate::services::balancer::ChannelBalancer;
use crate::services::cursor::FeedCursor;
use crate::services::cycle::CycleManager;
use crate::services::session_service::SessionService;
use crate::services::view_tracker::ViewTracker;

pub struct FeedService {
    sessions: Arc<SessionService>,
    views: Arc<ViewTracker>,
    content_repo: Arc<dyn ContentRepository>,
    cycles: CycleManager,
    settings: FeedSettings,
}

impl FeedService {
    pub fn new(
        sessions: Arc<SessionService>,
        views: Arc<ViewTracker>,
        content_repo: Arc<dyn ContentRepository>,
        settings: FeedSettings,
    ) -> Self {
        Self {
            sessions,
            views,
            cycles: CycleManager::new(content_repo.clone()),
            content_repo,
            settings,
        }
    }

    /// Mixed feed across all channels, balanced so no channel dominates a run.
    pub async fn home_feed(&self, request: HomeFeedRequest) -> Result<ContentBatch, DomainError> {
        // 1. Parameters
        let limit = self.resolve_limit(request.limit)?;
        let max_consecutive = self.resolve_max_consecutive(request.max_consecutive)?;
        let position = FeedCursor::decode(request.cursor.as_deref())?;

        // 2. Session activity + exclusion set
        self.sessions.require_active(&request.session_id).await?;
        let viewed = self.views.viewed_set(&request.session_id).await?;

        // 3. One extra row tells us whether another page exists
        let query = ContentQuery::new(FeedScope::Global, limit + 1)
            .at_position(position)
            .excluding(viewed);
        let mut candidates = self.content_repo.fetch(&query).await?;
        let has_more = candidates.len() > limit;

        // 4. The page is the newest `limit` candidates; balancing only reorders it,
        // so nothing newer than the cursor is left behind.
        candidates.truncate(limit);
        let next_cursor = candidates
            .last()
            .map(|oldest| FeedCursor::encode(oldest, position.and_then(|p| p.floor)));
        let items = ChannelBalancer::new(max_consecutive).balance(candidates);

        debug!(
            "Home feed for session {}: {} item(s), has_more={}",
            request.session_id,
            items.len(),
            has_more
        );

        Ok(ContentBatch {
            items,
            next_cursor,
            has_more,
            cycle_count: None,
        })
    }

    /// Single-channel feed in strict recency order, recycled once fresh supply runs out.
    pub async fn channel_feed(
        &self,
        request: ChannelFeedRequest,
    ) -> Result<ContentBatch, DomainError> {
        // 1. Parameters
        let channel = request.channel_id.trim();
        if channel.is_empty() {
            return Err(DomainError::ValidationError("channelId is required".into()));
        }
        let limit = self.resolve_limit(request.limit)?;
        let position = FeedCursor::decode(request.cursor.as_deref())?;

        // 2. Session activity + exclusion set
        self.sessions.require_active(&request.session_id).await?;
        let viewed = self.views.viewed_set(&request.session_id).await?;

        // 3. One extra row tells us whether another page exists
        let query = ContentQuery::new(FeedScope::Channel(channel.to_string()), limit + 1)
            .at_position(position)
            .excluding(viewed.clone());
        let mut items = self.content_repo.fetch(&query).await?;
        let mut has_more = items.len() > limit;
        items.truncate(limit);

        // Pages already on the second pass stay above its floor.
        let mut floor = position.and_then(|p| p.floor);

        // 4. Short first-pass page: try a second pass over the channel
        let mut cycle_count = None;
        if items.len() < limit && floor.is_none() {
            let outcome = self.cycles.backfill(channel, &viewed, &items, limit).await?;
            if let Some(last) = outcome.recycled.last() {
                info!(
                    "Session {} recycled channel {} ({} item(s))",
                    request.session_id,
                    channel,
                    outcome.recycled.len()
                );
                // Everything below the incoming cursor went out on this page.
                floor = Some(position.map_or(last.watermark, |p| p.before));
            }
            items.extend(outcome.recycled);
            has_more = outcome.has_more;
            cycle_count = outcome.cycle_count;
        }

        let next_cursor = items.last().map(|last| FeedCursor::encode(last, floor));

        Ok(ContentBatch {
            items,
            next_cursor,
            has_more,
            cycle_count,
        })
    }

    fn resolve_limit(&self, requested: Option<usize>) -> Result<usize, DomainError> {
        let limit = requested.unwrap_or(self.settings.default_limit);
        if !(MIN_FEED_LIMIT..=self.settings.max_limit).contains(&limit) {
            return Err(DomainError::ValidationError(format!(
                "limit must be between {} and {}",
                MIN_FEED_LIMIT, self.settings.max_limit
            )));
        }
        Ok(limit)
    }

    fn resolve_max_consecutive(&self, requested: Option<usize>) -> Result<usize, DomainError> {
        let max = requested.unwrap_or(self.settings.default_max_consecutive);
        if !(MIN_MAX_CONSECUTIVE..=MAX_MAX_CONSECUTIVE).contains(&max) {
            return Err(DomainError::ValidationError(format!(
                "maxConsecutive must be between {} and {}",
                MIN_MAX_CONSECUTIVE, MAX_MAX_CONSECUTIVE
            )));
        }
        Ok(max)
    }
}

// ============================================================================
// Feed API - Content Handlers
// File: crates/feed-api/src/handlers/content.rs
// ============================================================================
//! Infinite feed HTTP handlers (home and channel)

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use validator::Validate;

use feed_core::domain::{ChannelFeedRequest, ContentBatch, HomeFeedRequest};
use feed_core::services::FeedService;

use crate::dto::{parse_session_id, ChannelFeedQuery, HomeFeedQuery};
use crate::error::ApiError;

/// GET /api/v2/content/home?sessionId=..&cursor=..&limit=..&maxConsecutive=..
pub async fn home_feed(
    State(feed): State<Arc<FeedService>>,
    query: Result<Query<HomeFeedQuery>, QueryRejection>,
) -> Result<Json<ContentBatch>, ApiError> {
    let Query(query) = query?;
    query.validate()?;

    let batch = feed
        .home_feed(HomeFeedRequest {
            session_id: parse_session_id(&query.session_id)?,
            cursor: query.cursor,
            limit: query.limit,
            max_consecutive: query.max_consecutive,
        })
        .await?;

    Ok(Json(batch))
}

/// GET /api/v2/content/channel/{channel_id}?sessionId=..&cursor=..&limit=..
pub async fn channel_feed(
    State(feed): State<Arc<FeedService>>,
    Path(channel_id): Path<String>,
    query: Result<Query<ChannelFeedQuery>, QueryRejection>,
) -> Result<Json<ContentBatch>, ApiError> {
    let Query(query) = query?;
    query.validate()?;

    let batch = feed
        .channel_feed(ChannelFeedRequest {
            session_id: parse_session_id(&query.session_id)?,
            channel_id,
            cursor: query.cursor,
            limit: query.limit,
        })
        .await?;

    Ok(Json(batch))
}

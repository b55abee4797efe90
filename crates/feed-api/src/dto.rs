//! Request and response payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use feed_core::domain::{Session, SessionStats};

use crate::error::ApiError;

/// Session ids arrive as strings; anything that is not a UUID cannot be a live session.
pub fn parse_session_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::SessionExpired(raw.to_string()))
}

// ============================================================================
// Session
// ============================================================================

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionRequest {
    #[validate(length(max = 512))]
    pub device_fingerprint: Option<String>,
    pub existing_session_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionResponse {
    pub session_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub is_new: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityResponse {
    pub session_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

impl From<Session> for ActivityResponse {
    fn from(session: Session) -> Self {
        Self {
            session_id: session.session_id,
            expires_at: session.expires_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MarkViewedRequest {
    #[serde(default)]
    #[validate(length(max = 200))]
    pub item_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkViewedResponse {
    pub success: bool,
    pub viewed_count: u64,
    pub session_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateSessionResponse {
    pub session_id: String,
    pub is_valid: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatsResponse {
    pub total_viewed: u64,
    pub session_age_minutes: i64,
    pub is_active: bool,
}

impl From<SessionStats> for SessionStatsResponse {
    fn from(stats: SessionStats) -> Self {
        Self {
            total_viewed: stats.total_viewed,
            session_age_minutes: stats.session_age_minutes,
            is_active: stats.is_active,
        }
    }
}

// ============================================================================
// Content
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct HomeFeedQuery {
    #[validate(length(min = 1))]
    pub session_id: String,
    pub cursor: Option<String>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<usize>,
    #[validate(range(min = 1, max = 10))]
    pub max_consecutive: Option<usize>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChannelFeedQuery {
    #[validate(length(min = 1))]
    pub session_id: String,
    pub cursor: Option<String>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<usize>,
}

// ============================================================================
// Health
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<&'static str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleanup_running: Option<bool>,
}

// ============================================================================
// Feed API - Session Handlers
// File: crates/feed-api/src/handlers/session.rs
// ============================================================================
//! Session lifecycle HTTP handlers (start, activity, views, stats, validate)

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use feed_core::services::SessionService;

use crate::dto::{
    parse_session_id, ActivityResponse, MarkViewedRequest, MarkViewedResponse,
    SessionStatsResponse, StartSessionRequest, StartSessionResponse, ValidateSessionResponse,
};
use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/v2/session/start
pub async fn start_session(
    State(sessions): State<Arc<SessionService>>,
    payload: Option<Json<StartSessionRequest>>,
) -> Result<Json<StartSessionResponse>, ApiError> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    payload.validate()?;

    // A stale or malformed prior id just means a fresh session.
    let existing = payload
        .existing_session_id
        .as_deref()
        .and_then(|raw| Uuid::parse_str(raw.trim()).ok());

    let started = sessions.start(payload.device_fingerprint, existing).await?;

    Ok(Json(StartSessionResponse {
        session_id: started.session.session_id,
        expires_at: started.session.expires_at,
        is_new: started.is_new,
    }))
}

/// PUT /api/v2/session/{session_id}/activity
/// PUT /api/v2/content/{session_id}/activity
pub async fn update_activity(
    State(sessions): State<Arc<SessionService>>,
    Path(session_id): Path<String>,
) -> Result<Json<ActivityResponse>, ApiError> {
    let not_found = || ApiError::NotFound(format!("Session not found or expired: {}", session_id));

    let id = Uuid::parse_str(session_id.trim()).map_err(|_| not_found())?;
    let session = sessions.extend(&id).await?.ok_or_else(not_found)?;

    Ok(Json(session.into()))
}

/// POST /api/v2/session/{session_id}/views
/// POST /api/v2/content/{session_id}/viewed
pub async fn mark_viewed(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    payload: Result<Json<MarkViewedRequest>, JsonRejection>,
) -> Result<Json<MarkViewedResponse>, ApiError> {
    let Json(payload) = payload?;
    payload.validate()?;

    // Nothing to record, so the session id is not looked at
    let viewed_count = if payload.item_ids.is_empty() {
        0
    } else {
        let id = parse_session_id(&session_id)?;
        state.views.mark_viewed(&id, &payload.item_ids).await?
    };

    Ok(Json(MarkViewedResponse {
        success: true,
        viewed_count,
        session_id,
    }))
}

/// GET /api/v2/session/{session_id}/stats
pub async fn session_stats(
    State(sessions): State<Arc<SessionService>>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionStatsResponse>, ApiError> {
    let not_found = || ApiError::NotFound(format!("Session not found: {}", session_id));

    let id = Uuid::parse_str(session_id.trim()).map_err(|_| not_found())?;
    let stats = sessions.stats(&id).await?.ok_or_else(not_found)?;

    Ok(Json(stats.into()))
}

/// GET /api/v2/session/{session_id}/validate
pub async fn validate_session(
    State(sessions): State<Arc<SessionService>>,
    Path(session_id): Path<String>,
) -> Result<Json<ValidateSessionResponse>, ApiError> {
    let is_valid = match Uuid::parse_str(session_id.trim()) {
        Ok(id) => sessions.validate(&id).await?,
        Err(_) => false,
    };

    if !is_valid {
        info!("Session {} is no longer valid", session_id);
    }

    Ok(Json(ValidateSessionResponse {
        session_id,
        is_valid,
        timestamp: Utc::now(),
    }))
}

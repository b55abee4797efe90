use axum::{extract::State, Json};
use chrono::Utc;

use crate::dto::HealthResponse;
use crate::state::AppState;

const FEATURES: [&str; 4] = [
    "infinite-scroll",
    "session-management",
    "content-deduplication",
    "channel-balancing",
];

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now(),
        features: None,
        cleanup_running: None,
    })
}

/// GET /api/v2/health
pub async fn api_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: "v2",
        timestamp: Utc::now(),
        features: Some(FEATURES.to_vec()),
        cleanup_running: Some(state.cleanup.is_running()),
    })
}

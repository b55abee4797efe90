//! Router assembly

use axum::{
    http::HeaderValue,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::handlers::{content, health, session};
use crate::state::AppState;

pub fn build_router(state: AppState, cors_origin: Option<&str>) -> Router {
    let session_routes = Router::new()
        .route("/start", post(session::start_session))
        .route("/{session_id}/activity", put(session::update_activity))
        .route("/{session_id}/views", post(session::mark_viewed))
        .route("/{session_id}/stats", get(session::session_stats))
        .route("/{session_id}/validate", get(session::validate_session));

    let content_routes = Router::new()
        .route("/home", get(content::home_feed))
        .route("/channel/{channel_id}", get(content::channel_feed))
        .route("/{session_id}/viewed", post(session::mark_viewed))
        .route("/{session_id}/activity", put(session::update_activity));

    let api_v2 = Router::new()
        .route("/health", get(health::api_health))
        .nest("/session", session_routes)
        .nest("/content", content_routes);

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/v2", api_v2)
        .layer(cors_layer(cors_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    match origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any),
        Some(Err(e)) => {
            warn!("Ignoring invalid CORS origin: {}", e);
            CorsLayer::permissive()
        }
        None => CorsLayer::permissive(),
    }
}

use std::sync::Arc;

use axum::extract::FromRef;

use feed_core::services::{FeedService, SessionCleanupJob, SessionService, ViewTracker};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionService>,
    pub views: Arc<ViewTracker>,
    pub feed: Arc<FeedService>,
    pub cleanup: Arc<SessionCleanupJob>,
}

impl FromRef<AppState> for Arc<SessionService> {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

impl FromRef<AppState> for Arc<FeedService> {
    fn from_ref(state: &AppState) -> Self {
        state.feed.clone()
    }
}

// ============================================================================
// Feed Core - View Tracker
// File: crates/feed-core/src/services/view_tracker.rs
// ============================================================================
//! Per-session viewed-item set

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use feed_shared::constants::MAX_MARK_VIEWED_BATCH;

use crate::error::DomainError;
use crate::repositories::ViewRepository;
use crate::services::session_service::SessionService;

pub struct ViewTracker {
    sessions: Arc<SessionService>,
    view_repo: Arc<dyn ViewRepository>,
}

impl ViewTracker {
    pub fn new(sessions: Arc<SessionService>, view_repo: Arc<dyn ViewRepository>) -> Self {
        Self {
            sessions,
            view_repo,
        }
    }

    /// Record `item_ids` as seen. Idempotent; returns how many were new.
    pub async fn mark_viewed(
        &self,
        session_id: &Uuid,
        item_ids: &[String],
    ) -> Result<u64, DomainError> {
        if item_ids.is_empty() {
            return Ok(0);
        }
        if item_ids.len() > MAX_MARK_VIEWED_BATCH {
            return Err(DomainError::ValidationError(format!(
                "at most {} itemIds per request",
                MAX_MARK_VIEWED_BATCH
            )));
        }

        // 1. Marking views counts as activity
        self.sessions.require_active(session_id).await?;

        // 2. Drop blanks and in-request duplicates, keep first occurrence
        let mut seen = HashSet::with_capacity(item_ids.len());
        let unique: Vec<String> = item_ids
            .iter()
            .map(|id| id.trim())
            .filter(|id| !id.is_empty() && seen.insert(*id))
            .map(str::to_string)
            .collect();

        if unique.is_empty() {
            return Ok(0);
        }

        // 3. Insert, conflicts are no-ops
        let inserted = self
            .view_repo
            .insert_views(session_id, &unique, self.sessions.now())
            .await?;

        info!(
            "Session {} marked {} item(s) viewed ({} new)",
            session_id,
            unique.len(),
            inserted
        );
        Ok(inserted)
    }

    pub async fn viewed_set(&self, session_id: &Uuid) -> Result<HashSet<String>, DomainError> {
        let viewed = self.view_repo.viewed_item_ids(session_id).await?;
        debug!("Session {} has {} viewed item(s)", session_id, viewed.len());
        Ok(viewed)
    }
}

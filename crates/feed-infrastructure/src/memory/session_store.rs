// ============================================================================
// Feed Infrastructure - In-Memory Session Store
// File: crates/feed-infrastructure/src/memory/session_store.rs
// ============================================================================

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{debug, info};
use uuid::Uuid;

use feed_core::domain::Session;
use feed_core::error::DomainError;
use feed_core::repositories::{SessionRepository, ViewRepository};

/// Thread-safe session and session-view store on DashMap.
/// Deleting a session drops its views, like the `ON DELETE CASCADE` in the schema.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<DashMap<Uuid, Session>>,
    views: Arc<DashMap<Uuid, HashMap<String, DateTime<Utc>>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        info!("Initializing in-memory session store");
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionStore {
    async fn create(&self, session: &Session) -> Result<Session, DomainError> {
        if self.sessions.contains_key(&session.session_id) {
            return Err(DomainError::StorageError(format!(
                "duplicate session id {}",
                session.session_id
            )));
        }
        self.sessions.insert(session.session_id, session.clone());
        Ok(session.clone())
    }

    async fn find_by_id(&self, session_id: &Uuid) -> Result<Option<Session>, DomainError> {
        Ok(self.sessions.get(session_id).map(|entry| entry.value().clone()))
    }

    async fn touch(
        &self,
        session_id: &Uuid,
        now: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<Session>, DomainError> {
        let Some(mut entry) = self.sessions.get_mut(session_id) else {
            return Ok(None);
        };
        let session = entry.value_mut();
        if !session.is_active || session.expires_at < now {
            return Ok(None);
        }

        session.last_activity = session.last_activity.max(now);
        session.expires_at = session.expires_at.max(expires_at);
        Ok(Some(session.clone()))
    }

    async fn deactivate(&self, session_id: &Uuid) -> Result<(), DomainError> {
        if let Some(mut entry) = self.sessions.get_mut(session_id) {
            entry.value_mut().is_active = false;
        }
        Ok(())
    }

    async fn deactivate_expired(&self, now: DateTime<Utc>) -> Result<u64, DomainError> {
        let mut count = 0;
        for mut entry in self.sessions.iter_mut() {
            let session = entry.value_mut();
            if session.is_active && session.expires_at < now {
                session.is_active = false;
                count += 1;
            }
        }
        Ok(count)
    }

    async fn delete_expired_before(&self, cutoff: DateTime<Utc>) -> Result<u64, DomainError> {
        let doomed: Vec<Uuid> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().expires_at < cutoff)
            .map(|entry| *entry.key())
            .collect();

        for session_id in &doomed {
            self.sessions.remove(session_id);
            self.views.remove(session_id);
        }

        debug!("Deleted {} expired session(s)", doomed.len());
        Ok(doomed.len() as u64)
    }
}

#[async_trait]
impl ViewRepository for InMemorySessionStore {
    async fn insert_views(
        &self,
        session_id: &Uuid,
        item_ids: &[String],
        viewed_at: DateTime<Utc>,
    ) -> Result<u64, DomainError> {
        // Holding the session entry keeps a concurrent delete from orphaning the views.
        let Some(_session) = self.sessions.get(session_id) else {
            return Err(DomainError::StorageError(format!(
                "session {} does not exist",
                session_id
            )));
        };

        let mut entry = self.views.entry(*session_id).or_default();
        let mut inserted = 0;
        for item_id in item_ids {
            if !entry.contains_key(item_id) {
                entry.insert(item_id.clone(), viewed_at);
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn viewed_item_ids(&self, session_id: &Uuid) -> Result<HashSet<String>, DomainError> {
        Ok(self
            .views
            .get(session_id)
            .map(|entry| entry.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn count_views(&self, session_id: &Uuid) -> Result<u64, DomainError> {
        Ok(self
            .views
            .get(session_id)
            .map(|entry| entry.len() as u64)
            .unwrap_or(0))
    }
}

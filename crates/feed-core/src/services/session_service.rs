// ============================================================================
// Feed Core - Session Service
// File: crates/feed-core/src/services/session_service.rs
// ============================================================================
//! Session lifecycle: create, validate with lazy expiry, sliding extend, cleanup

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::domain::{CleanupReport, Session, SessionPolicy, SessionStart, SessionStats};
use crate::error::DomainError;
use crate::repositories::{SessionRepository, ViewRepository};

pub struct SessionService {
    session_repo: Arc<dyn SessionRepository>,
    view_repo: Arc<dyn ViewRepository>,
    clock: Arc<dyn Clock>,
    policy: SessionPolicy,
}

impl SessionService {
    pub fn new(
        session_repo: Arc<dyn SessionRepository>,
        view_repo: Arc<dyn ViewRepository>,
        clock: Arc<dyn Clock>,
        policy: SessionPolicy,
    ) -> Self {
        Self {
            session_repo,
            view_repo,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> SessionPolicy {
        self.policy
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Create a fresh session with a full TTL window
    pub async fn create(&self, device_fingerprint: Option<String>) -> Result<Session, DomainError> {
        let session = Session::new(device_fingerprint, self.clock.now(), self.policy.ttl);
        let created = self.session_repo.create(&session).await?;

        info!("Created new session: {}", created.session_id);
        Ok(created)
    }

    /// Reactivate `existing_session_id` when it is still valid, otherwise create a new session
    pub async fn start(
        &self,
        device_fingerprint: Option<String>,
        existing_session_id: Option<Uuid>,
    ) -> Result<SessionStart, DomainError> {
        if let Some(existing_id) = existing_session_id {
            if let Some(session) = self.extend(&existing_id).await? {
                info!("Reactivated existing session: {}", existing_id);
                return Ok(SessionStart {
                    session,
                    is_new: false,
                });
            }
            debug!("Session {} cannot be reactivated, creating a new one", existing_id);
        }

        let session = self.create(device_fingerprint).await?;
        Ok(SessionStart {
            session,
            is_new: true,
        })
    }

    /// `true` when the session exists, is active, and is inside its TTL window.
    /// An expired session is marked inactive the first time it is seen here.
    pub async fn validate(&self, session_id: &Uuid) -> Result<bool, DomainError> {
        Ok(self.find_valid(session_id).await?.is_some())
    }

    /// Slide the TTL window forward. `None` when the session is not currently valid.
    pub async fn extend(&self, session_id: &Uuid) -> Result<Option<Session>, DomainError> {
        // 1. Re-validate (lazy expiry happens here)
        if self.find_valid(session_id).await?.is_none() {
            warn!("Attempted to extend invalid session: {}", session_id);
            return Ok(None);
        }

        // 2. Monotonic push of the window
        let now = self.clock.now();
        let extended = self
            .session_repo
            .touch(session_id, now, now + self.policy.ttl)
            .await?;

        if extended.is_none() {
            // Expired or deactivated between the two statements.
            warn!("Session {} expired while being extended", session_id);
        }
        Ok(extended)
    }

    /// Extend or fail with `InvalidSession`. Used by every activity-bearing call.
    pub async fn require_active(&self, session_id: &Uuid) -> Result<Session, DomainError> {
        self.extend(session_id)
            .await?
            .ok_or_else(|| DomainError::InvalidSession(session_id.to_string()))
    }

    pub async fn stats(&self, session_id: &Uuid) -> Result<Option<SessionStats>, DomainError> {
        let Some(session) = self.session_repo.find_by_id(session_id).await? else {
            return Ok(None);
        };

        let now = self.clock.now();
        let total_viewed = self.view_repo.count_views(session_id).await?;

        Ok(Some(SessionStats {
            total_viewed,
            session_age_minutes: session.age(now).num_minutes(),
            is_active: session.is_valid(now),
        }))
    }

    /// Two-phase sweep: deactivate expired sessions, then hard-delete sessions
    /// that expired more than the retention window ago.
    pub async fn cleanup(&self) -> Result<CleanupReport, DomainError> {
        let now = self.clock.now();

        let deactivated = self.session_repo.deactivate_expired(now).await?;
        let deleted = self
            .session_repo
            .delete_expired_before(now - self.policy.retention)
            .await?;

        Ok(CleanupReport {
            deactivated,
            deleted,
        })
    }

    async fn find_valid(&self, session_id: &Uuid) -> Result<Option<Session>, DomainError> {
        let Some(session) = self.session_repo.find_by_id(session_id).await? else {
            return Ok(None);
        };

        if !session.is_active {
            return Ok(None);
        }

        if session.is_expired(self.clock.now()) {
            debug!("Session {} expired, marking inactive", session_id);
            if let Err(e) = self.session_repo.deactivate(session_id).await {
                // Cleanup will catch it; the answer is "invalid" either way.
                warn!("Failed to deactivate expired session {}: {}", session_id, e);
            }
            return Ok(None);
        }

        Ok(Some(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::repositories::{MockSessionRepository, MockViewRepository};
    use chrono::Duration;
    use mockall::predicate::eq;

    fn service(
        repo: MockSessionRepository,
        views: MockViewRepository,
        clock: Arc<ManualClock>,
    ) -> SessionService {
        SessionService::new(Arc::new(repo), Arc::new(views), clock, SessionPolicy::default())
    }

    fn session_at(now: DateTime<Utc>) -> Session {
        Session::new(None, now, Duration::minutes(15))
    }

    #[tokio::test]
    async fn test_create_sets_ttl_window() {
        let now = Utc::now();
        let clock = Arc::new(ManualClock::new(now));

        let mut repo = MockSessionRepository::new();
        repo.expect_create()
            .times(1)
            .returning(|s| Ok(s.clone()));

        let session = service(repo, MockViewRepository::new(), clock)
            .create(Some("fp".into()))
            .await
            .unwrap();

        assert_eq!(session.created_at, now);
        assert_eq!(session.expires_at, now + Duration::minutes(15));
        assert_eq!(session.device_fingerprint.as_deref(), Some("fp"));
        assert!(session.is_active);
    }

    #[tokio::test]
    async fn test_validate_missing_session_is_false() {
        let mut repo = MockSessionRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));
        repo.expect_deactivate().never();

        let svc = service(repo, MockViewRepository::new(), Arc::new(ManualClock::new(Utc::now())));
        assert!(!svc.validate(&Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn test_validate_expired_marks_inactive() {
        let start = Utc::now();
        let clock = Arc::new(ManualClock::new(start));
        let stored = session_at(start);
        let id = stored.session_id;

        let mut repo = MockSessionRepository::new();
        repo.expect_find_by_id()
            .with(eq(id))
            .returning(move |_| Ok(Some(stored.clone())));
        repo.expect_deactivate()
            .with(eq(id))
            .times(1)
            .returning(|_| Ok(()));

        let svc = service(repo, MockViewRepository::new(), clock.clone());
        clock.advance(Duration::minutes(16));
        assert!(!svc.validate(&id).await.unwrap());
    }

    #[tokio::test]
    async fn test_validate_survives_failed_lazy_deactivation() {
        let start = Utc::now();
        let clock = Arc::new(ManualClock::new(start));
        let stored = session_at(start);
        let id = stored.session_id;

        let mut repo = MockSessionRepository::new();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        repo.expect_deactivate()
            .returning(|_| Err(DomainError::StorageError("connection reset".into())));

        let svc = service(repo, MockViewRepository::new(), clock.clone());
        clock.advance(Duration::minutes(30));
        assert_eq!(svc.validate(&id).await, Ok(false));
    }

    #[tokio::test]
    async fn test_extend_pushes_window_from_now() {
        let start = Utc::now();
        let clock = Arc::new(ManualClock::new(start));
        let stored = session_at(start);
        let id = stored.session_id;
        let touched_at = start + Duration::minutes(10);

        let mut repo = MockSessionRepository::new();
        let found = stored.clone();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(found.clone())));
        repo.expect_touch()
            .with(eq(id), eq(touched_at), eq(touched_at + Duration::minutes(15)))
            .times(1)
            .returning(move |_, now, expires_at| {
                let mut s = stored.clone();
                s.last_activity = now;
                s.expires_at = expires_at;
                Ok(Some(s))
            });

        let svc = service(repo, MockViewRepository::new(), clock.clone());
        clock.advance(Duration::minutes(10));

        let extended = svc.extend(&id).await.unwrap().unwrap();
        assert_eq!(extended.expires_at, extended.last_activity + Duration::minutes(15));
    }

    #[tokio::test]
    async fn test_extend_expired_session_returns_none() {
        let start = Utc::now();
        let clock = Arc::new(ManualClock::new(start));
        let stored = session_at(start);
        let id = stored.session_id;

        let mut repo = MockSessionRepository::new();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        repo.expect_deactivate().returning(|_| Ok(()));
        repo.expect_touch().never();

        let svc = service(repo, MockViewRepository::new(), clock.clone());
        clock.advance(Duration::minutes(20));

        assert!(svc.extend(&id).await.unwrap().is_none());
        assert_eq!(
            svc.require_active(&id).await.unwrap_err(),
            DomainError::InvalidSession(id.to_string())
        );
    }

    #[tokio::test]
    async fn test_start_reactivates_valid_session() {
        let now = Utc::now();
        let stored = session_at(now);
        let id = stored.session_id;

        let mut repo = MockSessionRepository::new();
        let found = stored.clone();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(found.clone())));
        repo.expect_touch()
            .returning(move |_, _, _| Ok(Some(stored.clone())));
        repo.expect_create().never();

        let svc = service(repo, MockViewRepository::new(), Arc::new(ManualClock::new(now)));
        let started = svc.start(None, Some(id)).await.unwrap();

        assert!(!started.is_new);
        assert_eq!(started.session.session_id, id);
    }

    #[tokio::test]
    async fn test_start_with_unknown_session_creates_new() {
        let mut repo = MockSessionRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));
        repo.expect_create()
            .times(1)
            .returning(|s| Ok(s.clone()));

        let svc = service(repo, MockViewRepository::new(), Arc::new(ManualClock::new(Utc::now())));
        let stale = Uuid::new_v4();
        let started = svc.start(Some("fp".into()), Some(stale)).await.unwrap();

        assert!(started.is_new);
        assert_ne!(started.session.session_id, stale);
    }

    #[tokio::test]
    async fn test_cleanup_uses_retention_cutoff() {
        let now = Utc::now();

        let mut repo = MockSessionRepository::new();
        repo.expect_deactivate_expired()
            .with(eq(now))
            .times(1)
            .returning(|_| Ok(3));
        repo.expect_delete_expired_before()
            .with(eq(now - Duration::hours(24)))
            .times(1)
            .returning(|_| Ok(1));

        let svc = service(repo, MockViewRepository::new(), Arc::new(ManualClock::new(now)));
        let report = svc.cleanup().await.unwrap();

        assert_eq!(report, CleanupReport { deactivated: 3, deleted: 1 });
    }

    #[tokio::test]
    async fn test_stats_reports_age_and_views() {
        let start = Utc::now();
        let clock = Arc::new(ManualClock::new(start));
        let stored = session_at(start);
        let id = stored.session_id;

        let mut repo = MockSessionRepository::new();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        let mut views = MockViewRepository::new();
        views.expect_count_views()
            .with(eq(id))
            .returning(|_| Ok(7));

        let svc = service(repo, views, clock.clone());
        clock.advance(Duration::minutes(5));

        let stats = svc.stats(&id).await.unwrap().unwrap();
        assert_eq!(stats.total_viewed, 7);
        assert_eq!(stats.session_age_minutes, 5);
        assert!(stats.is_active);
    }

    #[tokio::test]
    async fn test_storage_errors_propagate() {
        let mut repo = MockSessionRepository::new();
        repo.expect_find_by_id()
            .returning(|_| Err(DomainError::StorageError("timeout".into())));

        let svc = service(repo, MockViewRepository::new(), Arc::new(ManualClock::new(Utc::now())));
        let err = svc.validate(&Uuid::new_v4()).await.unwrap_err();
        assert!(err.is_retryable());
    }
}

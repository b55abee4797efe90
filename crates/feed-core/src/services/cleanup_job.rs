// ============================================================================
// Feed Core - Session Cleanup Job
// File: crates/feed-core/src/services/cleanup_job.rs
// Description: Periodic two-phase session sweep with a re-entrancy guard
// ============================================================================

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::domain::CleanupReport;
use crate::error::DomainError;
use crate::services::session_service::SessionService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupRun {
    Completed(CleanupReport),
    /// A previous sweep was still in flight.
    Skipped,
}

pub struct SessionCleanupJob {
    sessions: Arc<SessionService>,
    running: AtomicBool,
}

/// Clears the running flag on drop, including when the sweep is cancelled.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SessionCleanupJob {
    pub fn new(sessions: Arc<SessionService>) -> Self {
        Self {
            sessions,
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub async fn run_once(&self) -> Result<CleanupRun, DomainError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Session cleanup already running, skipping this run");
            return Ok(CleanupRun::Skipped);
        }
        let _guard = RunningGuard(&self.running);

        let started = Instant::now();
        let report = self.sessions.cleanup().await?;

        info!(
            deactivated = report.deactivated,
            deleted = report.deleted,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Session cleanup completed"
        );
        Ok(CleanupRun::Completed(report))
    }

    /// Run on a fixed interval until the handle is aborted. The first sweep fires immediately.
    pub fn spawn(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        info!("Session cleanup scheduled every {}s", every.as_secs());

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                if let Err(e) = self.run_once().await {
                    error!("Session cleanup failed: {}", e);
                }
            }
        })
    }
}

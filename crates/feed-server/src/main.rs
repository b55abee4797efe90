use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{error, info, warn};

use feed_api::{build_router, AppState};
use feed_core::repositories::{ContentRepository, SessionRepository, ViewRepository};
use feed_core::services::{FeedService, SessionCleanupJob, SessionService, ViewTracker};
use feed_core::{Clock, SessionPolicy, SystemClock};
use feed_infrastructure::database::connection;
use feed_infrastructure::{
    InMemoryContentStore, InMemorySessionStore, PgContentRepository, PgSessionRepository,
};
use feed_shared::config::{AppConfig, DatabaseSettings, StorageBackend};
use feed_shared::telemetry::init_telemetry;

/// Repository set for the configured backend
struct Storage {
    sessions: Arc<dyn SessionRepository>,
    views: Arc<dyn ViewRepository>,
    content: Arc<dyn ContentRepository>,
}

async fn open_storage(settings: &DatabaseSettings) -> anyhow::Result<Storage> {
    match settings.backend {
        StorageBackend::Postgres => {
            let url = settings
                .url
                .as_deref()
                .context("database.url is required for the postgres backend")?;

            info!("Connecting to database...");
            let pool = connection::create_pool(url, settings).await?;
            info!("Database connection established.");

            if settings.run_migrations {
                connection::run_migrations(&pool).await?;
            }

            let sessions = Arc::new(PgSessionRepository::new(pool.clone()));
            Ok(Storage {
                sessions: sessions.clone(),
                views: sessions,
                content: Arc::new(PgContentRepository::new(pool)),
            })
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage, sessions will not survive a restart");
            let store = Arc::new(InMemorySessionStore::new());
            Ok(Storage {
                sessions: store.clone(),
                views: store,
                content: Arc::new(InMemoryContentStore::new()),
            })
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration (also reads .env)
    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize telemetry
    init_telemetry(&config.logging)?;
    info!("{} starting ({})...", config.app.name, config.app.env);

    // Storage
    let storage = open_storage(&config.database).await?;

    // Services
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let policy = SessionPolicy::from_minutes_and_hours(
        config.session.ttl_minutes,
        config.session.retention_hours,
    );
    let sessions = Arc::new(SessionService::new(
        storage.sessions,
        storage.views.clone(),
        clock,
        policy,
    ));
    let views = Arc::new(ViewTracker::new(sessions.clone(), storage.views));
    let feed = Arc::new(FeedService::new(
        sessions.clone(),
        views.clone(),
        storage.content,
        config.feed.clone(),
    ));

    // Background cleanup
    let cleanup = Arc::new(SessionCleanupJob::new(sessions.clone()));
    let cleanup_task = cleanup
        .clone()
        .spawn(Duration::from_secs(config.session.cleanup_interval_seconds));

    // Build router
    let app = build_router(
        AppState {
            sessions,
            views,
            feed,
            cleanup,
        },
        config.app.cors_origin.as_deref(),
    );

    // Bind address
    let host: IpAddr = config.app.host.parse()?;
    let addr = SocketAddr::from((host, config.app.port));
    info!("Listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cleanup_task.abort();
    info!("Server stopped");
    Ok(())
}

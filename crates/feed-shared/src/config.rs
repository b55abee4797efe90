//! Configuration management

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;

use crate::constants::{
    DEFAULT_FEED_LIMIT, DEFAULT_MAX_CONSECUTIVE, MAX_FEED_LIMIT, MAX_MAX_CONSECUTIVE,
    MIN_FEED_LIMIT, MIN_MAX_CONSECUTIVE, SESSION_CLEANUP_INTERVAL_SECS,
    SESSION_RETENTION_HOURS, SESSION_TTL_MINUTES,
};
use crate::error::AppError;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub database: DatabaseSettings,
    pub session: SessionSettings,
    pub feed: FeedSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub env: String,
    pub host: String,
    pub port: u16,
    pub name: String,
    pub cors_origin: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub backend: StorageBackend,
    pub url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionSettings {
    pub ttl_minutes: i64,
    pub retention_hours: i64,
    pub cleanup_interval_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedSettings {
    pub default_limit: usize,
    pub max_limit: usize,
    pub default_max_consecutive: usize,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
    /// Directory for daily rolling log files; stdout only when unset.
    pub file_dir: Option<String>,
}

impl AppConfig {
    /// Load defaults, `config/default`, `config/{APP_ENV}`, then `APP__*` env vars.
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        Self::from_builder(builder)
    }

    /// Apply built-in defaults underneath the given sources and validate the result.
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, AppError> {
        let config = builder
            .set_default("app.env", "development")?
            .set_default("app.host", "127.0.0.1")?
            .set_default("app.port", 8080)?
            .set_default("app.name", "feed-server")?
            .set_default("database.backend", "memory")?
            .set_default("database.max_connections", 10)?
            .set_default("database.acquire_timeout_seconds", 3)?
            .set_default("database.run_migrations", true)?
            .set_default("session.ttl_minutes", SESSION_TTL_MINUTES)?
            .set_default("session.retention_hours", SESSION_RETENTION_HOURS)?
            .set_default("session.cleanup_interval_seconds", SESSION_CLEANUP_INTERVAL_SECS)?
            .set_default("feed.default_limit", DEFAULT_FEED_LIMIT as i64)?
            .set_default("feed.max_limit", MAX_FEED_LIMIT as i64)?
            .set_default("feed.default_max_consecutive", DEFAULT_MAX_CONSECUTIVE as i64)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            .build()?;

        let settings: AppConfig = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.session.ttl_minutes <= 0 {
            return Err(AppError::InvalidConfig("session.ttl_minutes must be positive".into()));
        }
        if self.session.retention_hours < 0 {
            return Err(AppError::InvalidConfig(
                "session.retention_hours must not be negative".into(),
            ));
        }
        if self.session.cleanup_interval_seconds == 0 {
            return Err(AppError::InvalidConfig(
                "session.cleanup_interval_seconds must be positive".into(),
            ));
        }
        if !(MIN_FEED_LIMIT..=MAX_FEED_LIMIT).contains(&self.feed.max_limit) {
            return Err(AppError::InvalidConfig(format!(
                "feed.max_limit must be within [{}, {}]",
                MIN_FEED_LIMIT, MAX_FEED_LIMIT
            )));
        }
        if !(MIN_FEED_LIMIT..=self.feed.max_limit).contains(&self.feed.default_limit) {
            return Err(AppError::InvalidConfig(format!(
                "feed.default_limit must be within [{}, {}]",
                MIN_FEED_LIMIT, self.feed.max_limit
            )));
        }
        if !(MIN_MAX_CONSECUTIVE..=MAX_MAX_CONSECUTIVE).contains(&self.feed.default_max_consecutive) {
            return Err(AppError::InvalidConfig(format!(
                "feed.default_max_consecutive must be within [{}, {}]",
                MIN_MAX_CONSECUTIVE, MAX_MAX_CONSECUTIVE
            )));
        }
        if self.database.backend == StorageBackend::Postgres
            && self.database.url.as_deref().map_or(true, str::is_empty)
        {
            return Err(AppError::InvalidConfig(
                "database.url is required for the postgres backend".into(),
            ));
        }
        Ok(())
    }
}

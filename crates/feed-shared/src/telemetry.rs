//! Telemetry setup

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, LoggingSettings};
use crate::error::AppError;

/// Install the global subscriber. `RUST_LOG` takes precedence over the configured level.
pub fn init_telemetry(settings: &LoggingSettings) -> Result<(), AppError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .map_err(|e| AppError::TelemetryError(e.to_string()))?;

    // Daily rotation: {dir}/feed.YYYY-MM-DD.log
    let file_appender = match &settings.file_dir {
        Some(dir) => Some(
            RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("feed")
                .filename_suffix("log")
                .build(dir)
                .map_err(|e| AppError::TelemetryError(e.to_string()))?,
        ),
        None => None,
    };

    match settings.format {
        LogFormat::Json => {
            let file_layer = file_appender.map(|writer| {
                fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_target(true)
                    .with_level(true)
            });

            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stdout)
                        .with_target(true)
                        .with_level(true)
                        .with_thread_ids(true),
                )
                .with(file_layer)
                .try_init()
                .map_err(|e| AppError::TelemetryError(e.to_string()))?;
        }
        LogFormat::Pretty => {
            let file_layer = file_appender.map(|writer| {
                fmt::layer()
                    .with_writer(writer)
                    .with_target(true)
                    .with_level(true)
                    .with_ansi(false)
            });

            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .pretty()
                        .with_writer(std::io::stdout)
                        .with_target(true)
                        .with_level(true),
                )
                .with(file_layer)
                .try_init()
                .map_err(|e| AppError::TelemetryError(e.to_string()))?;
        }
    }

    Ok(())
}

//! Tracing subscriber initialisation.
//!
//! Stdout carries SSE frames, so human-readable logs go to stderr. With
//! `logging.file` enabled, a daily-rolling file is written into the logs
//! directory as well.

use dgen_core::config::LoggingSettings;
use dgen_core::{DgenError, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

const LOG_FILE_PREFIX: &str = "dgen.log";

type Base = Layered<EnvFilter, Registry>;
type BoxedLayer = Box<dyn Layer<Base> + Send + Sync + 'static>;

/// Keeps the background file writer alive. Dropping it flushes pending
/// lines, so hold it until the process exits.
#[must_use]
pub struct TelemetryGuard {
    _file_writer: Option<WorkerGuard>,
}

/// Builds the filter: `RUST_LOG` wins over the configured level.
pub fn env_filter(settings: &LoggingSettings) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&settings.level).map_err(|e| {
            DgenError::config(format!("invalid log level '{}': {}", settings.level, e))
        }),
    }
}

/// Installs the global subscriber.
///
/// `extra` is added as is (e.g. a [`SessionEventLayer`](crate::SessionEventLayer)).
pub fn init_telemetry<L>(
    settings: &LoggingSettings,
    logs_dir: &Path,
    extra: Option<L>,
) -> Result<TelemetryGuard>
where
    L: Layer<Base> + Send + Sync + 'static,
{
    let mut layers: Vec<BoxedLayer> = Vec::new();

    let stderr = fmt::layer().with_writer(std::io::stderr).with_target(true);
    layers.push(if settings.json {
        stderr.json().boxed()
    } else {
        stderr.boxed()
    });

    let mut file_writer = None;
    if settings.file {
        std::fs::create_dir_all(logs_dir)?;
        let appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let file = fmt::layer().with_writer(writer).with_ansi(false);
        layers.push(if settings.json {
            file.json().boxed()
        } else {
            file.boxed()
        });
        file_writer = Some(guard);
    }

    if let Some(extra) = extra {
        layers.push(extra.boxed());
    }

    tracing_subscriber::registry()
        .with(env_filter(settings)?)
        .with(layers)
        .try_init()
        .map_err(|e| DgenError::config(format!("failed to install tracing subscriber: {}", e)))?;

    tracing::debug!("Telemetry initialised (level: {}, file: {})", settings.level, settings.file);
    Ok(TelemetryGuard {
        _file_writer: file_writer,
    })
}

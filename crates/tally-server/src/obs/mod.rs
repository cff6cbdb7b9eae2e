//! Telemetry: console + rolling-file logging through `tracing`, and log-event
//! counters fed into the metrics registry.

pub mod log_metrics;

use std::fs;

use tally_core::error::{Result, TallyError};
use tally_core::MetricsRegistry;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

use crate::config::AppConfig;

pub use log_metrics::LogMetricsLayer;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Keeps the non-blocking file writers flushing; hold it for the process lifetime.
pub struct TelemetryGuard {
    _workers: Vec<WorkerGuard>,
}

/// `RUST_LOG` when set, else the configured level.
fn env_filter(cfg: &AppConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(cfg.log_level())
            .map_err(|e| TallyError::BadRequest(format!("invalid log level: {e}"))),
    }
}

/// Log counters never go below `info`, so debug chatter from dependencies
/// does not mint a label series per target.
pub fn log_metrics_filter(cfg: &AppConfig) -> LevelFilter {
    let configured = cfg.log_level().parse().unwrap_or(LevelFilter::INFO);
    configured.min(LevelFilter::INFO)
}

fn rolling(cfg: &AppConfig, prefix: &str) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .max_log_files(cfg.log.max_files)
        .build(&cfg.log.dir)
        .map_err(|e| TallyError::Internal(format!("log file init failed ({prefix}): {e}")))
}

/// Install the global subscriber.
pub fn init(cfg: &AppConfig, registry: &MetricsRegistry) -> Result<TelemetryGuard> {
    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut workers = Vec::new();

    let console = if cfg.is_development() {
        fmt::layer().compact().with_filter(env_filter(cfg)?).boxed()
    } else {
        fmt::layer().json().with_filter(env_filter(cfg)?).boxed()
    };
    layers.push(console);

    if cfg.log.files {
        fs::create_dir_all(&cfg.log.dir).map_err(|e| {
            TallyError::Internal(format!("create log dir failed ({}): {e}", cfg.log.dir))
        })?;

        let (app_writer, app_guard) = tracing_appender::non_blocking(rolling(cfg, "app")?);
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(app_writer)
                .with_filter(env_filter(cfg)?)
                .boxed(),
        );
        workers.push(app_guard);

        let (err_writer, err_guard) = tracing_appender::non_blocking(rolling(cfg, "error")?);
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(err_writer)
                .with_filter(LevelFilter::ERROR)
                .boxed(),
        );
        workers.push(err_guard);
    }

    layers.push(
        LogMetricsLayer::new(registry)
            .with_filter(log_metrics_filter(cfg))
            .boxed(),
    );

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|e| TallyError::Internal(format!("tracing init failed: {e}")))?;

    Ok(TelemetryGuard { _workers: workers })
}

//! Logging utilities
//!
//! Events are written under two targets, `app` for the session and the
//! presenter and `api` for the transport. Each target gets its own rolling
//! log file; the console shows both.

use crate::config::LogSettings;
use crate::{IrisError, Result};
use std::io::IsTerminal;
use std::path::Path;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::Targets;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

/// Log targets that get a file of their own
pub const LOG_TARGETS: &[&str] = &["app", "api"];

/// Rotated generations kept per log file
const MAX_LOG_FILES: usize = 5;

/// Keeps the background log writers alive; flushes them on drop
pub struct LogGuards {
    _guards: Vec<WorkerGuard>,
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize the global logging system
///
/// Returns `None` when both console and file output are switched off, in
/// which case no subscriber is installed. `RUST_LOG`, when set, takes
/// precedence over the configured level.
pub fn init_logging(settings: &LogSettings) -> Result<Option<LogGuards>> {
    if !settings.console && !settings.file {
        return Ok(None);
    }

    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut guards = Vec::new();

    if settings.console {
        layers.push(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal())
                .boxed(),
        );
    }

    if settings.file {
        std::fs::create_dir_all(&settings.dir)?;
        for target in LOG_TARGETS {
            let (writer, guard) = tracing_appender::non_blocking(file_appender(&settings.dir, target)?);
            guards.push(guard);
            layers.push(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_filter(Targets::new().with_target(*target, LevelFilter::TRACE))
                    .boxed(),
            );
        }
    }

    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(settings.level).into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
        .map_err(|e| IrisError::config(format!("Failed to initialize logging: {}", e)))?;

    Ok(Some(LogGuards { _guards: guards }))
}

/// Daily-rotated `<dir>/<target>.<date>.log`
///
/// tracing-appender rotates by time only, so the file is not capped at a
/// size; instead the newest `MAX_LOG_FILES` days are kept per target.
fn file_appender(dir: &Path, target: &str) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(target)
        .filename_suffix("log")
        .max_log_files(MAX_LOG_FILES)
        .build(dir)
        .map_err(|e| IrisError::config(format!("Failed to open log file for '{}': {}", target, e)))
}

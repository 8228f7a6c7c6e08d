//! Logging setup.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Setup logging with the given level.
pub fn setup_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty())
            .init();
    }
}

/// Setup logging with an additional daily-rolling file appender.
///
/// The returned guard must stay alive for the process lifetime or buffered
/// log lines are lost.
pub fn setup_logging_with_file(level: &str, json: bool, dir: &Path, prefix: &str) -> WorkerGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let appender = tracing_appender::rolling::daily(dir, prefix);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .with(fmt::layer().json().with_writer(writer).with_ansi(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty())
            .with(fmt::layer().with_writer(writer).with_ansi(false))
            .init();
    }

    guard
}

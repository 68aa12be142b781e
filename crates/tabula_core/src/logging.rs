use anyhow::Result;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::TableLayout;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "warn,tabula_core=info,tabula_docs=info,tabula_cli=info";

fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Initializes console logging on stderr.
///
/// Rendered tables and status notices go to stdout, so diagnostics stay out
/// of redirected output.
pub fn init_logging(filter: &str) -> Result<()> {
    tracing_subscriber::registry()
        .with(env_filter(filter))
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;
    Ok(())
}

/// Initializes logging to a daily-rolling file in `logs_dir` plus stderr.
/// Returns a guard that must be kept alive until the program exits.
pub fn init_logging_to_dir(logs_dir: &Path, filter: &str) -> Result<WorkerGuard> {
    std::fs::create_dir_all(logs_dir)?;

    let file_appender = tracing_appender::rolling::daily(logs_dir, "tabula");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(env_filter(filter))
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_ansi(false)
                .with_writer(non_blocking),
        )
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    Ok(guard)
}

/// File logging under `~/.tabula/logs`.
pub fn init_default_file_logging(filter: &str) -> Result<WorkerGuard> {
    let logs_dir = TableLayout::logs_dir()?;
    init_logging_to_dir(&logs_dir, filter)
}

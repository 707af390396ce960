use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "STAFFDESK_LOG";

fn env_filter(verbose: bool) -> EnvFilter {
    let fallback = if verbose { "staffdesk=debug" } else { "warn" };
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback))
}

pub fn init_stderr(verbose: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

/// The terminal browser owns the screen, so it logs to a daily file instead.
/// Keep the guard alive until the browser exits or buffered lines are lost.
pub fn init_file(dir: &Path, verbose: bool) -> Result<WorkerGuard> {
    std::fs::create_dir_all(dir)?;
    let appender = tracing_appender::rolling::daily(dir, "staffdesk.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .init();
    Ok(guard)
}

pub fn log_dir() -> PathBuf {
    match directories::ProjectDirs::from("", "", "staffdesk") {
        Some(proj_dirs) => proj_dirs.data_dir().join("logs"),
        None => PathBuf::from("logs"),
    }
}

//! Logging infrastructure for reefpipe workers.
//!
//! Structured logging with dual output:
//! - Writes to a per-process file under the log directory, so workers
//!   sharing a filesystem never interleave
//! - Also prints to stdout for the scheduler's job log
//! - Configurable via RUST_LOG environment variable

use std::fs;
use std::io;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping this guard will flush and close the log file writer.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Initialize the logging system.
///
/// Creates the log directory if needed and sets up dual output to a
/// per-process file and stdout. The filter defaults to INFO when
/// RUST_LOG is unset.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created.
pub fn init_logging(log_dir: &str) -> Result<LoggingGuard, io::Error> {
    fs::create_dir_all(log_dir)?;

    let log_file = format!("reefpipe.{}.log", std::process::id());
    let file_appender = tracing_appender::rolling::never(log_dir, log_file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_ansi(true);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

/// Default log directory path.
pub fn default_log_dir() -> &'static str {
    "logs"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_log_dir() {
        assert_eq!(default_log_dir(), "logs");
    }

    #[test]
    fn test_log_file_name_is_per_process() {
        // init_logging installs a global subscriber, so only the naming
        // scheme is checked here.
        let name = format!("reefpipe.{}.log", std::process::id());
        assert!(name.starts_with("reefpipe."));
        assert!(name.ends_with(".log"));
    }
}

use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::domain::DomainError;

/// Initialize the logging system with console output and file rotation.
///
/// Returns a guard that must be kept alive for the duration of the
/// application; dropping it flushes any remaining log lines.
pub fn init_logging(
    logs_dir: &Path,
    level: &str,
    file_logging: bool,
) -> Result<Option<WorkerGuard>, DomainError> {
    if file_logging {
        fs::create_dir_all(logs_dir)?;
    }

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("dictapad_lib={},warn", level)));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::NONE)
        .with_filter(env_filter);

    if file_logging {
        let file_appender = RollingFileAppender::new(Rotation::DAILY, logs_dir, "dictapad.log");

        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .json()
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(EnvFilter::new(format!("dictapad_lib={}", level)));

        // try_init: tests and restarted setups may initialize twice.
        if tracing_subscriber::registry()
            .with(console_layer)
            .with(file_layer)
            .try_init()
            .is_ok()
        {
            tracing::info!(
                logs_dir = ?logs_dir,
                level = level,
                "logging initialized with file output"
            );
        }

        Ok(Some(guard))
    } else {
        let _ = tracing_subscriber::registry().with(console_layer).try_init();

        tracing::info!(level = level, "logging initialized (console only)");

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_logging_initialization() {
        // The subscriber can only be installed once per process, so this
        // exercises the file-path setup rather than asserting on output.
        let temp_dir = env::temp_dir().join("dictapad_log_test");
        let _ = fs::remove_dir_all(&temp_dir);

        let guard = init_logging(&temp_dir, "info", true).unwrap();
        assert!(guard.is_some());
        assert!(temp_dir.exists());

        let _ = fs::remove_dir_all(&temp_dir);
    }
}

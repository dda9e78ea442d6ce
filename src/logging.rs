use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Where and how log records are written.
#[derive(Debug, Clone)]
pub struct LoggingOptions {
    /// Directory for the daily rotating log files
    pub log_dir: Utf8PathBuf,
    /// File name prefix, e.g. `qrstudio` → `qrstudio.2026-10-17`
    pub prefix: String,
    /// Debug level instead of info
    pub debug: bool,
    /// Mirror records to stderr
    pub console: bool,
    /// Write the file log as JSON lines
    pub json: bool,
}

impl LoggingOptions {
    pub fn new(log_dir: impl Into<Utf8PathBuf>, debug: bool) -> Self {
        Self {
            log_dir: log_dir.into(),
            prefix: crate::APP_NAME.to_string(),
            debug,
            console: false,
            json: false,
        }
    }

    pub fn with_console(mut self, console: bool) -> Self {
        self.console = console;
        self
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    /// `RUST_LOG` when set, otherwise debug/info from `debug`.
    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            if self.debug {
                EnvFilter::new("debug")
            } else {
                EnvFilter::new("info")
            }
        })
    }
}

/// Setup logging with a rotating file appender and optional console output.
///
/// Stdout is left alone so command output stays pipeable; console records
/// go to stderr.
///
/// # Returns
/// A guard that must be held for the duration of the program to keep logging active
pub fn setup_logging(options: &LoggingOptions) -> Result<WorkerGuard> {
    ensure_log_dir(options)?;

    let file_appender = rolling::daily(&options.log_dir, &options.prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = if options.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(non_blocking)
            .with_target(true)
            .with_thread_ids(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false) // No ANSI codes in log files
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    let console_layer = options.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(options.env_filter())
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!(
        "Logging initialized: dir={}, prefix={}, debug={}, console={}, json={}",
        options.log_dir,
        options.prefix,
        options.debug,
        options.console,
        options.json
    );

    Ok(guard)
}

fn ensure_log_dir(options: &LoggingOptions) -> Result<()> {
    if !options.log_dir.exists() {
        fs::create_dir_all(&options.log_dir)
            .with_context(|| format!("Failed to create log directory: {}", options.log_dir))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_options_defaults() {
        let options = LoggingOptions::new("logs", true);
        assert_eq!(options.prefix, "qrstudio");
        assert!(options.debug);
        assert!(!options.console);
        assert!(!options.json);

        let options = options.with_console(true).with_json(true);
        assert!(options.console && options.json);
    }

    #[test]
    fn test_log_directory_created() {
        let temp_dir = TempDir::new().unwrap();
        let log_dir = Utf8PathBuf::try_from(temp_dir.path().join("nested/logs")).unwrap();

        // Only the directory step; installing a global subscriber would
        // conflict with other tests in the same process
        ensure_log_dir(&LoggingOptions::new(log_dir.clone(), false)).unwrap();

        assert!(log_dir.exists());
    }
}

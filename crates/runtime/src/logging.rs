//! Log subscriber setup for hosts embedding the runtime.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use arbiter_core::ArbiterConfig;

use crate::api::{Result, RuntimeError};

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set.
    pub directive: String,
    /// Also write to `<log_dir>/<file_name>` when set.
    pub log_dir: Option<PathBuf>,
    pub file_name: String,
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directive: "info".to_owned(),
            log_dir: None,
            file_name: "arbiter.log".to_owned(),
            ansi: true,
        }
    }
}

impl LoggingConfig {
    /// Raises the default level to `debug` in debug mode.
    pub fn from_arbiter(config: &ArbiterConfig) -> Self {
        Self {
            directive: if config.debug_mode { "debug" } else { "info" }.to_owned(),
            ..Self::default()
        }
    }

    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }
}

/// Installs the global subscriber: stderr plus an optional log file.
///
/// Keep the returned guard alive for as long as file output is wanted.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.directive))
        .map_err(|e| RuntimeError::Logging(e.to_string()))?;

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(config.ansi);

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|e| RuntimeError::Logging(e.to_string()))?;
            let appender = tracing_appender::rolling::never(dir, &config.file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| RuntimeError::Logging(e.to_string()))?;

    tracing::info!(directive = %config.directive, file = ?config.log_dir, "logging initialized");
    Ok(guard)
}

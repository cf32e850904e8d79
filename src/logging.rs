use std::path::PathBuf;

use directories::ProjectDirs;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Environment variable holding an `EnvFilter` directive for stderr output
pub const LOG_ENV: &str = "TWINE_LOG";

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Directory for the daily JSON log file; `None` disables it
    pub log_dir: Option<PathBuf>,
    pub file_level: Level,
    /// Fallback stderr filter when `TWINE_LOG` is unset
    pub stderr_filter: String,
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        let log_dir = std::env::var_os("TWINE_LOG_DIR")
            .map(PathBuf::from)
            .or_else(|| ProjectDirs::from("", "", "twine").map(|dirs| dirs.data_local_dir().join("logs")));

        Self {
            log_dir,
            file_level: Level::INFO,
            stderr_filter: "warn".into(),
        }
    }
}

/// Install the global subscriber. Keep the returned guard alive for the
/// life of the program so buffered file output is flushed.
pub fn init_logging(config: LoggingConfig) -> Result<Option<WorkerGuard>, String> {
    let stderr_filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(&config.stderr_filter))
        .map_err(|e| e.to_string())?;

    let stderr_layer = fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(stderr_filter);

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|e| format!("{}: {e}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, "twine.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);

            let layer = fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .with_writer(writer)
                .with_filter(tracing_subscriber::filter::LevelFilter::from_level(config.file_level));

            (Some(layer), Some(guard))
        },
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| e.to_string())?;

    Ok(guard)
}

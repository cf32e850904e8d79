use std::{
    path::PathBuf,
    sync::{Arc, mpsc},
};

use tracing_appender::non_blocking::WorkerGuard;

use crate::{
    client::{ClientConfig, TwitterApi, TwitterService},
    config::TwineConfig,
    event::TwineEvent,
    logging::{LoggingConfig, init_logging},
    result::{Result, TwineError},
};

pub struct AppComponents {
    pub service: TwitterService,
    pub receiver: mpsc::Receiver<TwineEvent>,
    pub _log_guard: Option<WorkerGuard>,
}

/// Set up logging and the service; must run inside a Tokio runtime
pub fn initialize_app(config: TwineConfig, debug: bool) -> Result<AppComponents> {
    let log_guard = initialize_logging(&config, debug)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), service = ?config.service, "twine starting up");

    let (sender, receiver) = mpsc::channel();
    let service = create_service(sender, config, debug)?;

    Ok(AppComponents { service, receiver, _log_guard: log_guard })
}

fn initialize_logging(config: &TwineConfig, debug: bool) -> Result<Option<WorkerGuard>> {
    let mut logging_config = LoggingConfig::from_env();

    if let Some(log_level) = &config.log_level {
        if let Ok(level) = log_level.parse() {
            logging_config.file_level = level;
        }

        if log_level.eq_ignore_ascii_case("off") {
            logging_config.log_dir = None;
        }
    }

    if debug {
        logging_config.stderr_filter = "twine=debug".into();
    }

    init_logging(logging_config)
        .map_err(|e| TwineError::GeneralError(format!("Failed to initialize logging: {e}").into()))
}

fn create_service(
    sender: mpsc::Sender<TwineEvent>,
    config: TwineConfig,
    debug: bool,
) -> Result<TwitterService> {
    let mut client_config = ClientConfig::from(config).with_debug_logging(debug);
    if debug {
        client_config.debug.log_directory = Some(debug_log_directory());
    }

    let api = Arc::new(TwitterApi::new(client_config)?);
    Ok(TwitterService::from_api(api, sender)?)
}

fn debug_log_directory() -> PathBuf {
    std::env::temp_dir().join("twine-responses")
}

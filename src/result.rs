use std::path::PathBuf;

use compact_str::{CompactString, ToCompactString};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TwineError>;

#[derive(Debug, Clone, Error)]
pub enum TwineError {
    #[error("The configured OAuth credentials were rejected: {0}")]
    InvalidCredentials(CompactString),

    #[error("Service is over capacity, try again later")]
    ServiceUnavailable,

    #[error("Rate limit exceeded")]
    RateLimited { reset_at: Option<i64> },

    #[error("Configuration file not found: {path}")]
    ConfigFileNotFound { path: PathBuf },

    #[error("Failed to load configuration from: {path}")]
    ConfigLoadError { path: PathBuf, message: String },

    #[error("Failed to save configuration to: {path}")]
    ConfigSaveError { path: PathBuf, message: String },

    #[error("Invalid configuration: {field}")]
    ConfigValidationError { field: String, message: String },

    #[error("{0}")]
    GeneralError(CompactString),
}

impl From<reqwest::Error> for TwineError {
    fn from(e: reqwest::Error) -> Self {
        TwineError::GeneralError(e.to_compact_string())
    }
}

impl From<crate::client::ClientError> for TwineError {
    fn from(e: crate::client::ClientError) -> Self {
        TwineError::from(&e)
    }
}

impl TwineError {
    pub fn config_file_not_found(path: PathBuf) -> Self {
        Self::ConfigFileNotFound { path }
    }

    /// Create a configuration load error
    pub fn config_load_error(path: PathBuf, source: impl std::fmt::Display) -> Self {
        Self::ConfigLoadError { path, message: source.to_string() }
    }

    /// Create a configuration save error
    pub fn config_save_error(path: PathBuf, source: impl std::fmt::Display) -> Self {
        Self::ConfigSaveError { path, message: source.to_string() }
    }

    pub fn config_validation_error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidationError { field: field.into(), message: message.into() }
    }
}

use std::path::{Path, PathBuf};

use compact_str::CompactString;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::{
    client::{Credentials, Service},
    result::{Result, TwineError},
};

/// Settings persisted in `twine.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwineConfig {
    pub service: Service,
    pub consumer_key: CompactString,
    pub consumer_secret: CompactString,
    pub token: CompactString,
    pub token_secret: CompactString,
    /// Items requested per timeline page
    pub count: u32,
    /// Automatic retries on network errors and fail whales
    pub retries: u32,
    pub api_url: Option<CompactString>,
    pub stream_url: Option<CompactString>,
    pub log_level: Option<CompactString>,
}

impl Default for TwineConfig {
    fn default() -> Self {
        Self {
            service: Service::Twitter,
            consumer_key: CompactString::default(),
            consumer_secret: CompactString::default(),
            token: CompactString::default(),
            token_secret: CompactString::default(),
            count: 20,
            retries: 0,
            api_url: None,
            stream_url: None,
            log_level: None,
        }
    }
}

impl TwineConfig {
    /// OAuth credentials, or `None` when none of them are set.
    ///
    /// A partially filled set is returned as-is so validation can name the
    /// missing field.
    pub fn credentials(&self) -> Option<Credentials> {
        let fields = [
            &self.consumer_key,
            &self.consumer_secret,
            &self.token,
            &self.token_secret,
        ];
        if fields.iter().all(|f| f.is_empty()) {
            return None;
        }

        Some(Credentials::new(
            self.consumer_key.clone(),
            self.consumer_secret.clone(),
            self.token.clone(),
            self.token_secret.clone(),
        ))
    }
}

pub fn default_config_path() -> PathBuf {
    if let Some(dirs) = BaseDirs::new() {
        dirs.config_dir().join("twine.toml")
    } else {
        PathBuf::from("twine.toml")
    }
}

pub fn load_config(config_file: &Path) -> Result<TwineConfig> {
    if !config_file.exists() {
        return Err(TwineError::config_file_not_found(config_file.to_path_buf()));
    }

    confy::load_path(config_file)
        .map_err(|e| TwineError::config_load_error(config_file.to_path_buf(), e))
}

pub fn save_config(config_file: &Path, config: &TwineConfig) -> Result<()> {
    confy::store_path(config_file, config)
        .map_err(|e| TwineError::config_save_error(config_file.to_path_buf(), e))?;

    Ok(())
}

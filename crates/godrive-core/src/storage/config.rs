//! Configuration management
//!
//! Settings live in `~/.config/godrive/config.toml`.
//! Priority for the API URL: CLI argument > GODRIVE_API_URL > config.toml

use super::Result;
use crate::api::client::{ClientConfig, DEFAULT_TIMEOUT_SECS};
use crate::core::cache::DEFAULT_STALE_TIME;
use crate::error::{ConfigError, StorageError};
use crate::utils::validation::validate_url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const API_URL_ENV: &str = "GODRIVE_API_URL";
pub const TIMEOUT_ENV: &str = "GODRIVE_TIMEOUT_SECS";
pub const DEFAULT_PROFILE: &str = "default";

/// Keys accepted by [`Config::set`].
pub const KEYS: [&str; 4] = ["api_url", "timeout_seconds", "stale_time_seconds", "profile"];

/// Application configuration
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    /// Backend base URL
    pub api_url: Option<String>,
    pub timeout_seconds: Option<u64>,
    /// How long cached server state counts as fresh
    pub stale_time_seconds: Option<u64>,
    /// Keyring profile the session is saved under
    pub profile: Option<String>,
}

impl Config {
    /// Load configuration from file; a missing file yields the defaults.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p,
            None => Self::config_file_path()?,
        };

        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&config_path).map_err(|source| StorageError::FileIo {
            path: config_path.to_string_lossy().to_string(),
            source,
        })?;

        toml::from_str(&content).map_err(|e| StorageError::ConfigParseError {
            message: format!("Failed to parse {}: {}", config_path.display(), e),
        })
    }

    /// Save configuration to file
    pub fn save(&self, path: Option<PathBuf>) -> Result<()> {
        let config_path = match path {
            Some(p) => p,
            None => Self::config_file_path()?,
        };

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|source| StorageError::FileIo {
                path: parent.to_string_lossy().to_string(),
                source,
            })?;
        }

        let toml_content = toml::to_string(self).map_err(|e| StorageError::ConfigParseError {
            message: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(&config_path, toml_content).map_err(|source| StorageError::FileIo {
            path: config_path.to_string_lossy().to_string(),
            source,
        })
    }

    pub fn config_file_path() -> Result<PathBuf> {
        let home_dir = dirs::home_dir().ok_or(StorageError::ConfigDirNotFound)?;
        Ok(Self::config_file_in(&home_dir.join(".config").join("godrive")))
    }

    /// Config file inside a caller-chosen directory (`--config-dir`).
    pub fn config_file_in(dir: &Path) -> PathBuf {
        dir.join("config.toml")
    }

    /// API URL with the environment variable taking precedence over the file.
    pub fn get_api_url(&self) -> Option<String> {
        std::env::var(API_URL_ENV)
            .ok()
            .filter(|s| !s.is_empty())
            .or_else(|| self.api_url.clone())
    }

    pub fn timeout(&self) -> Duration {
        let seconds = std::env::var(TIMEOUT_ENV)
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|s| *s > 0)
            .or(self.timeout_seconds)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Duration::from_secs(seconds)
    }

    pub fn stale_time(&self) -> Duration {
        self.stale_time_seconds
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_STALE_TIME)
    }

    pub fn profile_name(&self) -> &str {
        self.profile.as_deref().unwrap_or(DEFAULT_PROFILE)
    }

    /// Update one setting by name, validating the value.
    pub fn set(&mut self, key: &str, value: &str) -> std::result::Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidValue {
            field: key.to_string(),
            value: value.to_string(),
            reason,
        };

        match key {
            "api_url" => {
                validate_url(value).map_err(invalid)?;
                self.api_url = Some(value.trim_end_matches('/').to_string());
            }
            "timeout_seconds" => self.timeout_seconds = Some(parse_seconds(value).map_err(invalid)?),
            "stale_time_seconds" => {
                self.stale_time_seconds = Some(parse_seconds(value).map_err(invalid)?)
            }
            "profile" => {
                if value.trim().is_empty() {
                    return Err(invalid("profile name cannot be empty".to_string()));
                }
                self.profile = Some(value.trim().to_string());
            }
            _ => {
                return Err(invalid(format!(
                    "unknown key, expected one of: {}",
                    KEYS.join(", ")
                )));
            }
        }
        Ok(())
    }

    /// HTTP client settings; `api_url_override` wins over every other source.
    pub fn client_config(
        &self,
        api_url_override: Option<&str>,
    ) -> std::result::Result<ClientConfig, ConfigError> {
        let api_url = api_url_override
            .map(str::to_string)
            .or_else(|| self.get_api_url())
            .ok_or(ConfigError::MissingApiUrl)?;

        validate_url(&api_url).map_err(|reason| ConfigError::InvalidValue {
            field: "api_url".to_string(),
            value: api_url.clone(),
            reason,
        })?;

        Ok(ClientConfig::new(api_url).with_timeout(self.timeout()))
    }
}

fn parse_seconds(value: &str) -> std::result::Result<u64, String> {
    match value.trim().parse::<u64>() {
        Ok(0) => Err("must be greater than zero".to_string()),
        Ok(seconds) => Ok(seconds),
        Err(e) => Err(e.to_string()),
    }
}

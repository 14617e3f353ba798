//! Configuration loading and management.
//!
//! Configuration is loaded with the following precedence:
//! 1. Environment variables (`HUTARKA_*`)
//! 2. Config file (`~/.hutarka/config.toml`)
//! 3. Defaults

use crate::error::{Error, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration struct.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,

    /// Remote endpoint configuration.
    pub endpoint: EndpointConfig,
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding conversations and the identity token.
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_hutarka_home(),
        }
    }
}

/// Remote assistant endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// URL the chat request is posted to.
    pub url: String,

    /// Budget for a single exchange, in seconds.
    pub timeout_seconds: u64,
}

impl EndpointConfig {
    /// Exchange budget as a `Duration`.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:5000/chat".to_string(),
            timeout_seconds: 60,
        }
    }
}

fn default_hutarka_home() -> PathBuf {
    dirs::home_dir().map_or_else(|| PathBuf::from(".hutarka"), |h| h.join(".hutarka"))
}

/// Load configuration with precedence: env vars → file → defaults.
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or if the
/// resulting endpoint settings are unusable.
pub fn load_config() -> Result<Config> {
    let mut config = Config::default();

    let config_path = get_config_path();
    if config_path.exists() {
        let contents = fs::read_to_string(&config_path).map_err(Error::Storage)?;
        config = toml::from_str(&contents).map_err(|e| Error::Config(e.to_string()))?;
    }

    apply_env_overrides(&mut config);
    validate(&config)?;

    Ok(config)
}

fn get_config_path() -> PathBuf {
    if let Ok(path) = env::var("HUTARKA_CONFIG") {
        return PathBuf::from(path);
    }

    if let Ok(home) = env::var("HUTARKA_HOME") {
        return PathBuf::from(home).join("config.toml");
    }

    default_hutarka_home().join("config.toml")
}

fn apply_env_overrides(config: &mut Config) {
    if let Ok(path) = env::var("HUTARKA_STORAGE_PATH") {
        config.storage.path = PathBuf::from(path);
    } else if let Ok(home) = env::var("HUTARKA_HOME") {
        config.storage.path = PathBuf::from(home);
    }

    if let Ok(url) = env::var("HUTARKA_ENDPOINT_URL") {
        config.endpoint.url = url;
    }

    if let Ok(val) = env::var("HUTARKA_TIMEOUT_SECONDS") {
        if let Ok(secs) = val.parse() {
            config.endpoint.timeout_seconds = secs;
        }
    }
}

fn validate(config: &Config) -> Result<()> {
    if config.endpoint.url.trim().is_empty() {
        return Err(Error::Config("endpoint.url must not be empty".to_string()));
    }
    if config.endpoint.timeout_seconds == 0 {
        return Err(Error::Config(
            "endpoint.timeout_seconds must be positive".to_string(),
        ));
    }
    Ok(())
}

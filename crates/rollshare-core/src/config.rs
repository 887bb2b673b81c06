//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the API base URL, the public origin used for share links,
//! the request timeout and where the refresh token is kept.
//!
//! Configuration is stored at `~/.config/rollshare/config.json`. Environment
//! variables override the file.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
pub const APP_NAME: &str = "rollshare";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Backend the portal was built against.
pub const DEFAULT_API_BASE_URL: &str = "https://tnp-recruitment-challenge.manitvig.live";

/// Origin that share links point at.
pub const DEFAULT_ORIGIN: &str = "http://localhost:3000";

/// Requests that take longer than this fail with a network error.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;

pub const ENV_API_BASE_URL: &str = "ROLLSHARE_API_BASE_URL";
pub const ENV_ORIGIN: &str = "ROLLSHARE_ORIGIN";
pub const ENV_USERNAME: &str = "ROLLSHARE_USERNAME";
pub const ENV_PASSWORD: &str = "ROLLSHARE_PASSWORD";

/// Where the refresh token is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DurableBackend {
    /// JSON file in the data directory
    #[default]
    File,
    /// OS keychain
    Keyring,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub origin: String,
    pub request_timeout_secs: u64,
    pub durable_store: DurableBackend,
    pub last_username: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            origin: DEFAULT_ORIGIN.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            durable_store: DurableBackend::default(),
            last_username: None,
        }
    }
}

impl Config {
    /// Load config from disk, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = Self::load_from(&path)?;
        config.apply_env();
        Ok(config)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_API_BASE_URL).filter(|v| !v.is_empty()) {
            self.api_base_url = url;
        }
        if let Some(origin) = lookup(ENV_ORIGIN).filter(|v| !v.is_empty()) {
            self.origin = origin;
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for the per-session access token file.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Directory for the durable refresh token file.
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }
}

//! Client configuration management.
//!
//! This module handles loading and saving the client configuration: where
//! the same-origin credential endpoint and the remote identity provider
//! live, the request deadline, and the last used username.
//!
//! Configuration is stored at `~/.config/natasha/config.json`. Environment
//! variables override the file:
//!
//! | Env Var                        | Field                  |
//! |--------------------------------|------------------------|
//! | `NATASHA_CREDENTIAL_URL`       | `credential_url`       |
//! | `NATASHA_AUTH_URL`             | `auth_url`             |
//! | `NATASHA_REQUEST_TIMEOUT_SECS` | `request_timeout_secs` |

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::{DEFAULT_AUTH_URL, REQUEST_TIMEOUT_SECS};
use crate::auth::FlowSettings;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "natasha";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Cookie jar file name, kept in the cache directory
const COOKIE_JAR_FILE: &str = "cookies.json";

/// Credential endpoint of a locally running `natasha-server`
pub const DEFAULT_CREDENTIAL_URL: &str = "http://127.0.0.1:3000/api";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub credential_url: String,
    pub auth_url: String,
    pub request_timeout_secs: u64,
    pub last_username: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            credential_url: DEFAULT_CREDENTIAL_URL.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            last_username: None,
        }
    }
}

impl Config {
    /// Load from the config file (if any), then apply environment overrides
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = Self::load_from(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for log files and the cookie jar
    pub fn cache_dir() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn cookie_jar_path() -> Result<PathBuf> {
        Ok(Self::cache_dir()?.join(COOKIE_JAR_FILE))
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("NATASHA_CREDENTIAL_URL") {
            self.credential_url = url;
        }
        if let Some(url) = lookup("NATASHA_AUTH_URL") {
            self.auth_url = url;
        }
        if let Some(secs) = lookup("NATASHA_REQUEST_TIMEOUT_SECS") {
            match secs.parse() {
                Ok(secs) => self.request_timeout_secs = secs,
                Err(_) => warn!(value = %secs, "Ignoring invalid NATASHA_REQUEST_TIMEOUT_SECS"),
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn flow_settings(&self) -> FlowSettings {
        FlowSettings {
            operation_timeout: self.request_timeout(),
        }
    }
}

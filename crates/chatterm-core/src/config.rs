use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::client::DEFAULT_SERVER_URL;
use crate::error::ConfigError;

/// Environment variable that overrides the configured server URL
pub const SERVER_URL_ENV: &str = "CHATTERM_SERVER_URL";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub server_url: String,
    pub title: String,
    pub subtitle: String,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            title: "AI Assistant".to_string(),
            subtitle: "Powered by Groq LLaMA".to_string(),
            log_level: "info".to_string(),
            log_dir: None,
        }
    }
}

impl Config {
    /// Load from the default location, falling back to defaults when the
    /// file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply the environment and command line, in that order of precedence
    /// over what was loaded.
    pub fn with_overrides(mut self, env_server_url: Option<String>, cli_server_url: Option<String>) -> Self {
        if let Some(url) = cli_server_url.or(env_server_url) {
            self.server_url = url;
        }
        self
    }

    /// Directory for log files, `<data dir>/chatterm/logs` unless configured.
    pub fn resolved_log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("chatterm")
                .join("logs")
        })
    }

    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;

        Ok(config_dir.join("chatterm").join("config.json"))
    }
}

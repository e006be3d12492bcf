use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::sync::DEFAULT_FRAGMENT_LIMIT;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

fn default_fragment_limit() -> i64 {
    DEFAULT_FRAGMENT_LIMIT
}

/// Sync configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Server URL (e.g., "http://localhost:8080")
    pub server_url: Option<String>,
    /// API key for authentication
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Changes requested per fragment
    #[serde(default = "default_fragment_limit")]
    pub fragment_limit: i64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            api_key: None,
            fragment_limit: DEFAULT_FRAGMENT_LIMIT,
        }
    }
}

impl SyncConfig {
    /// Returns true if sync is configured (has both server_url and api_key)
    pub fn is_configured(&self) -> bool {
        self.server_url.is_some() && self.api_key.is_some()
    }
}

/// Client configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Directory holding the client's sync state
    pub data_dir: ConfigValue<PathBuf>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    pub sync: SyncConfig,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    sync: Option<SyncConfig>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut data_dir = ConfigValue::new(Self::default_data_dir(), ConfigSource::Default);
        let mut config_file = None;
        let mut sync = SyncConfig::default();

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::Read(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::Parse(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(dir) = file_config.data_dir {
                // Relative paths are resolved against the config file's directory
                let resolved = if dir.is_relative() {
                    path.parent().map(|p| p.join(&dir)).unwrap_or(dir)
                } else {
                    dir
                };
                data_dir = ConfigValue::new(resolved, ConfigSource::File);
            }
            if let Some(sync_config) = file_config.sync {
                sync = sync_config;
            }
        }

        if let Ok(dir) = std::env::var("NOTESYNC_DATA_DIR") {
            data_dir = ConfigValue::new(PathBuf::from(dir), ConfigSource::Environment);
        }
        if let Ok(url) = std::env::var("NOTESYNC_SYNC_URL") {
            sync.server_url = Some(url);
        }
        if let Ok(key) = std::env::var("NOTESYNC_SYNC_API_KEY") {
            sync.api_key = Some(key);
        }

        if sync.fragment_limit < 1 || sync.fragment_limit > crate::sync::MAX_FRAGMENT_LIMIT {
            return Err(ConfigError::Invalid {
                key: "sync.fragment_limit",
                message: format!(
                    "must be between 1 and {}",
                    crate::sync::MAX_FRAGMENT_LIMIT
                ),
            });
        }

        Ok(Self {
            data_dir,
            config_file,
            sync,
        })
    }

    /// Path of the stored sync cursor.
    pub fn cursor_path(&self) -> PathBuf {
        self.data_dir.value.join(crate::sync::CURSOR_FILE)
    }

    /// Path of the local copy of synced books and notes.
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.value.join(crate::sync::STORE_FILE)
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/notesync/
    /// - macOS: ~/Library/Application Support/notesync/
    /// - Windows: %APPDATA%/notesync/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("notesync")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/notesync/
    /// - macOS: ~/Library/Application Support/notesync/
    /// - Windows: %APPDATA%/notesync/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("notesync")
    }

    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {1}", .0.display())]
    Read(PathBuf, #[source] std::io::Error),
    #[error("Failed to parse config file '{}': {1}", .0.display())]
    Parse(PathBuf, #[source] serde_yaml::Error),
    #[error("Invalid {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Server settings, read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub port: u16,
    pub database_path: PathBuf,
}

impl ServerConfig {
    pub const DEFAULT_PORT: u16 = 8080;

    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match std::env::var("NOTESYNC_PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                key: "NOTESYNC_PORT",
                message: format!("not a port number: {:?}", raw),
            })?,
            Err(_) => Self::DEFAULT_PORT,
        };

        let database_path = std::env::var("NOTESYNC_DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default_database_path());

        Ok(Self {
            port,
            database_path,
        })
    }

    pub fn default_database_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("notesync-server")
            .join("notesync.db")
    }
}

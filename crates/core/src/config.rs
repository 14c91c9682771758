//! Configuration loading
//!
//! Settings live in `lobby.toml` under the platform config directory.
//! Every section is optional; missing values fall back to defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Default port for the reference store
pub const DEFAULT_PORT: u16 = 7331;

const CONFIG_FILE: &str = "lobby.toml";

/// Chat client tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Interval between background refreshes while the panel is open
    pub poll_interval_ms: u64,
    /// Client-side cap on message length, in characters
    pub max_message_length: usize,
    /// Cap on display name length, checked when the name is chosen
    pub max_sender_name_length: usize,
    /// Upper bound on a single store request
    pub request_timeout_ms: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2000,
            max_message_length: 500,
            max_sender_name_length: 32,
            request_timeout_ms: 10_000,
        }
    }
}

impl ChatConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Reference store settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub port: u16,
    /// SQLite file for the log (None = platform data dir)
    pub database: Option<PathBuf>,
    /// Keep the log in memory only
    pub in_memory: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database: None,
            in_memory: false,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LobbyConfig {
    pub chat: ChatConfig,
    pub store: StoreConfig,
}

impl LobbyConfig {
    /// Load from the default config file, or defaults if it doesn't exist
    pub fn load() -> Result<Self> {
        match config_dir() {
            Ok(dir) => Self::load_from(dir.join(CONFIG_FILE)),
            Err(e) => {
                warn!(error = %e, "No config directory, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load from a specific file, or defaults if it doesn't exist
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let mut config: LobbyConfig = toml::from_str(&contents)?;
        config.fix_invalid_values();
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Replace values that would break the client with their defaults
    pub fn fix_invalid_values(&mut self) {
        let defaults = ChatConfig::default();
        if self.chat.poll_interval_ms == 0 {
            warn!("poll_interval_ms must be positive, using default");
            self.chat.poll_interval_ms = defaults.poll_interval_ms;
        }
        if self.chat.max_message_length == 0 {
            warn!("max_message_length must be positive, using default");
            self.chat.max_message_length = defaults.max_message_length;
        }
        if self.chat.max_sender_name_length == 0 {
            warn!("max_sender_name_length must be positive, using default");
            self.chat.max_sender_name_length = defaults.max_sender_name_length;
        }
        if self.chat.request_timeout_ms == 0 {
            warn!("request_timeout_ms must be positive, using default");
            self.chat.request_timeout_ms = defaults.request_timeout_ms;
        }
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "onyx", "lobby")
        .ok_or_else(|| Error::Config("Could not determine home directory".into()))
}

/// Platform config directory
pub fn config_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().to_path_buf())
}

/// Platform data directory (databases)
pub fn data_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = LobbyConfig::default();
        assert_eq!(config.chat.poll_interval(), Duration::from_millis(2000));
        assert_eq!(config.chat.max_message_length, 500);
        assert_eq!(config.chat.max_sender_name_length, 32);
        assert_eq!(config.store.port, DEFAULT_PORT);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = LobbyConfig::load_from(dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, LobbyConfig::default());
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[chat]\npoll_interval_ms = 500\n\n[store]\nport = 9000").unwrap();

        let config = LobbyConfig::load_from(&path).unwrap();
        assert_eq!(config.chat.poll_interval_ms, 500);
        assert_eq!(config.chat.max_message_length, 500);
        assert_eq!(config.store.port, 9000);
        assert!(!config.store.in_memory);
    }

    #[test]
    fn test_zero_values_repaired() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[chat]\npoll_interval_ms = 0\nmax_message_length = 0\n").unwrap();

        let config = LobbyConfig::load_from(&path).unwrap();
        assert_eq!(config.chat, ChatConfig::default());
    }

    #[test]
    fn test_bad_toml_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[chat\npoll").unwrap();

        assert!(matches!(
            LobbyConfig::load_from(&path),
            Err(Error::ConfigParse(_))
        ));
    }
}

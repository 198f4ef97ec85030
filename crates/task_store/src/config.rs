//! Store configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Which host the store should assume it is running in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformPreference {
    /// Use the runtime capability check.
    #[default]
    Auto,
    /// Always use the relational backend.
    Native,
    /// Always use the flat-store backend.
    Web,
}

/// Configuration for the task store.
///
/// ```toml
/// platform = "auto"
/// data_dir = "/home/me/.tasks"
/// database_file = "tasks_db.sqlite3"
/// storage_dir = "web_storage"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend selection override.
    pub platform: PlatformPreference,
    /// Directory holding all store files.
    pub data_dir: PathBuf,
    /// SQLite database file name, relative to `data_dir`.
    pub database_file: String,
    /// Key-value storage directory, relative to `data_dir`.
    pub storage_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            platform: PlatformPreference::Auto,
            data_dir: Self::default_data_dir(),
            database_file: "tasks_db.sqlite3".to_string(),
            storage_dir: PathBuf::from("web_storage"),
        }
    }
}

impl StoreConfig {
    /// Creates a config rooted at `data_dir` with default file names.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Returns the default data directory (~/.tasks/), falling back to a
    /// relative `.tasks` when no home directory is known.
    pub fn default_data_dir() -> PathBuf {
        dirs::home_dir()
            .map(|p| p.join(".tasks"))
            .unwrap_or_else(|| PathBuf::from(".tasks"))
    }

    /// Returns path to database file
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }

    /// Returns path to key-value storage directory
    pub fn storage_path(&self) -> PathBuf {
        self.data_dir.join(&self.storage_dir)
    }

    /// Loads configuration from `path`, or the defaults if it does not exist.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: StoreConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves configuration to `path`.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, StoreConfig::default());
        assert_eq!(config.platform, PlatformPreference::Auto);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "platform = \"web\"\ndata_dir = \"/srv/tasks\"\n").unwrap();

        let config = StoreConfig::load(&path).unwrap();
        assert_eq!(config.platform, PlatformPreference::Web);
        assert_eq!(
            config.database_path(),
            PathBuf::from("/srv/tasks/tasks_db.sqlite3")
        );
        assert_eq!(
            config.storage_path(),
            PathBuf::from("/srv/tasks/web_storage")
        );
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = StoreConfig::with_data_dir(dir.path());
        config.platform = PlatformPreference::Native;
        config.database_file = "custom.db".to_string();

        config.save(&path).unwrap();
        assert_eq!(StoreConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_platform_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "platform = \"desktop\"\n").unwrap();

        assert!(matches!(
            StoreConfig::load(&path),
            Err(ConfigError::ParseError(_))
        ));
    }
}

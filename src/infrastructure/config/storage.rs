//! Location and persistence of `config.toml`.

use super::app_config::AppConfig;
use directories::ProjectDirs;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

const APP_QUALIFIER: &str = "com";
const APP_ORGANIZATION: &str = "linuxmobile";
const APP_NAME: &str = "pixfetch";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Errors while locating, reading or writing the configuration file.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum ConfigError {
    #[error("failed to determine config directory")]
    ConfigDirNotFound,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: &'static str },
}

impl ConfigError {
    /// Rejected configuration value.
    #[must_use]
    pub const fn invalid(key: &'static str, reason: &'static str) -> Self {
        Self::Invalid { key, reason }
    }

    /// The file exists but its contents cannot be used.
    #[must_use]
    pub const fn is_unusable_file(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::Invalid { .. })
    }
}

/// Reads and writes `config.toml` in the platform config directory.
#[derive(Debug)]
pub struct StorageManager {
    config_dir: PathBuf,
}

impl StorageManager {
    /// Create a new `StorageManager`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration directory cannot be determined.
    pub fn new() -> Result<Self, ConfigError> {
        let config_dir = ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.config_dir().to_path_buf())
            .ok_or(ConfigError::ConfigDirNotFound)?;

        Ok(Self { config_dir })
    }

    /// Uses `path` as the configuration directory.
    #[must_use]
    pub fn with_dir(path: PathBuf) -> Self {
        Self { config_dir: path }
    }

    /// Returns the configuration directory path.
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Loads the application configuration.
    ///
    /// A missing file is created with defaults. A file that does not parse, or whose
    /// `[pipeline]` section holds unusable values, is left alone and the defaults are used.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or the default cannot be written.
    pub fn load_config(&self, path_override: Option<&Path>) -> Result<AppConfig, ConfigError> {
        let config_path = path_override.map_or_else(
            || self.config_dir.join(CONFIG_FILE_NAME),
            Path::to_path_buf,
        );

        match Self::read_config(&config_path) {
            Ok(Some(config)) => Ok(config),
            Ok(None) => {
                info!(path = %config_path.display(), "Config file not found, creating default");
                let default_config = AppConfig::default();
                Self::save_to_file(&config_path, &default_config)?;
                Ok(default_config)
            }
            Err(e) if e.is_unusable_file() => {
                warn!(error = %e, "Ignoring config file, using defaults");
                Ok(AppConfig::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Saves the application configuration to `config.toml`, creating the directory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be written.
    pub fn save_config(&self, config: &AppConfig) -> Result<(), ConfigError> {
        Self::save_to_file(&self.config_dir.join(CONFIG_FILE_NAME), config)
    }

    /// `Ok(None)` when there is no file at `path`.
    fn read_config(path: &Path) -> Result<Option<AppConfig>, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let config: AppConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.pipeline.validate()?;
        debug!(path = %path.display(), "Loaded config file");
        Ok(Some(config))
    }

    fn save_to_file<T: serde::Serialize>(path: &Path, data: &T) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(data)?;

        let parent = path
            .parent()
            .ok_or_else(|| std::io::Error::other("Invalid path"))?;
        fs::create_dir_all(parent)?;
        let mut temp_file = tempfile::NamedTempFile::new_in(parent)?;
        temp_file.write_all(content.as_bytes())?;
        temp_file.persist(path).map_err(|e| e.error)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_config_creates_default_if_missing() {
        let dir = tempdir().unwrap();
        let manager = StorageManager::with_dir(dir.path().join("nested"));

        let config = manager.load_config(None).unwrap();
        assert_eq!(config.pipeline.workers, 5);

        let config_file = dir.path().join("nested").join(CONFIG_FILE_NAME);
        assert!(config_file.exists());
        let written = fs::read_to_string(&config_file).unwrap();
        assert!(written.contains("[pipeline]"));
    }

    #[test]
    fn test_save_config_creates_directory() {
        let dir = tempdir().unwrap();
        let config_dir = dir.path().join("a").join("b");
        let manager = StorageManager::with_dir(config_dir.clone());

        manager.save_config(&AppConfig::default()).unwrap();
        assert!(config_dir.join(CONFIG_FILE_NAME).is_file());
    }

    #[test]
    fn test_load_config_handles_malformed_file() {
        let dir = tempdir().unwrap();
        let manager = StorageManager::with_dir(dir.path().to_path_buf());
        let config_file = dir.path().join(CONFIG_FILE_NAME);

        fs::write(&config_file, "invalid_toml = [").unwrap();

        let config = manager.load_config(None).unwrap();
        assert!(config.pipeline.disk_cache);
        let content = fs::read_to_string(&config_file).unwrap();
        assert_eq!(content, "invalid_toml = [");
    }

    #[test]
    fn test_read_config_reports_parse_error_with_path() {
        let dir = tempdir().unwrap();
        let config_file = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&config_file, "[pipeline]\nworkers = \"many\"\n").unwrap();

        let err = StorageManager::read_config(&config_file).unwrap_err();
        assert!(matches!(&err, ConfigError::Parse { path, .. } if path == &config_file));
        assert!(err.to_string().contains(CONFIG_FILE_NAME));
    }

    #[test]
    fn test_invalid_pipeline_section_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let manager = StorageManager::with_dir(dir.path().to_path_buf());
        let config_file = dir.path().join(CONFIG_FILE_NAME);
        let content = "[pipeline]\nworkers = 0\nmemory_budget_mb = 16\n";
        fs::write(&config_file, content).unwrap();

        assert!(matches!(
            StorageManager::read_config(&config_file),
            Err(ConfigError::Invalid { key: "pipeline.workers", .. })
        ));

        let config = manager.load_config(None).unwrap();
        assert_eq!(config.pipeline.workers, 5);
        assert!(config.pipeline.memory_budget_mb.is_none());
        assert_eq!(fs::read_to_string(&config_file).unwrap(), content);
    }

    #[test]
    fn test_save_and_load_config() {
        let dir = tempdir().unwrap();
        let manager = StorageManager::with_dir(dir.path().to_path_buf());

        let mut config = AppConfig::default();
        config.pipeline.workers = 9;
        config.pipeline.memory_budget_mb = Some(12);
        manager.save_config(&config).unwrap();

        let loaded = manager.load_config(None).unwrap();
        assert_eq!(loaded.pipeline.workers, 9);
        assert_eq!(loaded.pipeline.memory_budget_mb, Some(12));
    }

    #[test]
    fn test_path_override() {
        let dir = tempdir().unwrap();
        let manager = StorageManager::with_dir(dir.path().join("unused"));
        let custom = dir.path().join("custom.toml");
        fs::write(&custom, "[pipeline]\nworkers = 2\n").unwrap();

        let config = manager.load_config(Some(&custom)).unwrap();
        assert_eq!(config.pipeline.workers, 2);
        assert!(!dir.path().join("unused").exists());
    }
}

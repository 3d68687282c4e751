//! Application configuration.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::storage::ConfigError;
use crate::infrastructure::image::disk_cache::{StorageLocator, default_internal_root};
use crate::infrastructure::image::loader::{ImagePipelineConfig, default_memory_budget};

const APP_NAME: &str = "pixfetch";
const APP_QUALIFIER: &str = "com";
const APP_ORGANIZATION: &str = "linuxmobile";
const IMAGES_DIR: &str = "images";
const BYTES_PER_MB: usize = 1024 * 1024;

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Application configuration from file and CLI.
#[derive(Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Log file path.
    #[serde(skip)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Image pipeline configuration.
    #[serde(default)]
    pub pipeline: PipelineSettings,
}

/// Image pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Maximum concurrent load tasks.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Commit downloads to the disk cache.
    #[serde(default = "default_true")]
    pub disk_cache: bool,

    /// Memory cache budget in MiB. Defaults to an eighth of available memory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_budget_mb: Option<usize>,

    /// Preferred disk cache directory, used while it is available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_cache_dir: Option<PathBuf>,

    /// Fallback disk cache directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_cache_dir: Option<PathBuf>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            disk_cache: true,
            memory_budget_mb: None,
            external_cache_dir: None,
            internal_cache_dir: None,
        }
    }
}

impl PipelineSettings {
    /// Rejects values the pipeline cannot run with.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] naming the offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::invalid("pipeline.workers", "must be at least 1"));
        }
        if self.memory_budget_mb == Some(0) {
            return Err(ConfigError::invalid(
                "pipeline.memory_budget_mb",
                "must be positive, or omitted for the default",
            ));
        }
        Ok(())
    }

    /// Builds the pipeline configuration.
    #[must_use]
    pub fn to_pipeline_config(&self) -> ImagePipelineConfig {
        let memory_budget_bytes = self
            .memory_budget_mb
            .map_or_else(default_memory_budget, |mb| mb.saturating_mul(BYTES_PER_MB));
        ImagePipelineConfig {
            worker_count: self.workers.max(1),
            disk_cache_enabled: self.disk_cache,
            memory_budget_bytes,
        }
    }

    /// Builds the disk storage locator, falling back to platform defaults per root.
    #[must_use]
    pub fn storage_locator(&self) -> StorageLocator {
        let external = self
            .external_cache_dir
            .clone()
            .or_else(AppConfig::default_cache_dir);
        let internal = self
            .internal_cache_dir
            .clone()
            .unwrap_or_else(default_internal_root);
        StorageLocator::new(external, internal)
    }
}

fn default_workers() -> usize {
    5
}

fn default_true() -> bool {
    true
}

use super::args::CliArgs;

impl AppConfig {
    /// Merges CLI arguments into the configuration.
    pub fn merge_with_args(&mut self, args: &CliArgs) {
        if let Some(log_path) = &args.log_path {
            self.log_path = Some(log_path.clone());
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(workers) = args.workers {
            self.pipeline.workers = workers;
        }
        if let Some(disk_cache) = args.disk_cache {
            self.pipeline.disk_cache = disk_cache;
        }
        if let Some(memory_budget_mb) = args.memory_budget_mb {
            self.pipeline.memory_budget_mb = Some(memory_budget_mb);
        }
        if let Some(cache_dir) = &args.cache_dir {
            self.pipeline.external_cache_dir = Some(cache_dir.clone());
        }
    }

    /// Returns default image cache directory.
    #[must_use]
    pub fn default_cache_dir() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.cache_dir().join(IMAGES_DIR))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_path: None,
            log_level: LogLevel::Info,
            pipeline: PipelineSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn test_parse_pipeline_section() {
        let toml_content = r#"
            log_level = "debug"

            [pipeline]
            workers = 3
            disk_cache = false
            memory_budget_mb = 32
            internal_cache_dir = "/tmp/pixfetch-test"
        "#;

        let config: AppConfig = toml::from_str(toml_content).expect("Failed to parse config");

        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.pipeline.workers, 3);
        assert!(!config.pipeline.disk_cache);

        let pipeline = config.pipeline.to_pipeline_config();
        assert_eq!(pipeline.worker_count, 3);
        assert!(!pipeline.disk_cache_enabled);
        assert_eq!(pipeline.memory_budget_bytes, 32 * 1024 * 1024);
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.pipeline.workers, 5);
        assert!(config.pipeline.disk_cache);
        assert!(config.pipeline.memory_budget_mb.is_none());
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: AppConfig = toml::from_str("").expect("Failed to parse config");
        assert_eq!(config.pipeline.workers, 5);
        assert!(config.pipeline.disk_cache);
    }

    #[test]
    fn test_zero_workers_clamped() {
        let settings = PipelineSettings {
            workers: 0,
            ..PipelineSettings::default()
        };
        assert_eq!(settings.to_pipeline_config().worker_count, 1);
    }

    #[test]
    fn test_args_override_file() {
        let mut config = AppConfig::default();
        let args = CliArgs::parse_from([
            "pixfetch",
            "--workers",
            "2",
            "--disk-cache",
            "false",
            "--memory-budget-mb",
            "8",
            "--cache-dir",
            "/tmp/pixfetch-external",
            "http://img/1.png",
        ]);

        config.merge_with_args(&args);

        assert_eq!(config.pipeline.workers, 2);
        assert!(!config.pipeline.disk_cache);
        assert_eq!(config.pipeline.memory_budget_mb, Some(8));
        assert_eq!(
            config.pipeline.external_cache_dir,
            Some(PathBuf::from("/tmp/pixfetch-external"))
        );
    }

    #[test]
    fn test_locator_falls_back_to_internal_root() {
        let temp = tempfile::TempDir::new().unwrap();
        let mount = temp.path().join("sdcard");
        std::fs::write(&mount, b"").unwrap();
        let settings = PipelineSettings {
            external_cache_dir: Some(mount.join("images")),
            internal_cache_dir: Some(temp.path().join("internal")),
            ..PipelineSettings::default()
        };
        assert_eq!(settings.storage_locator().resolve(), temp.path().join("internal"));
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let settings = PipelineSettings {
            workers: 0,
            ..PipelineSettings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::Invalid { key: "pipeline.workers", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_budget() {
        let settings = PipelineSettings {
            memory_budget_mb: Some(0),
            ..PipelineSettings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::Invalid { key: "pipeline.memory_budget_mb", .. })
        ));
        assert!(PipelineSettings::default().validate().is_ok());
    }
}

//! Configuration management for the anime collector.
//!
//! Settings are loaded from a TOML file, with defaults matching the Jikan
//! API's public rate limits. A missing config file is not an error; the
//! defaults are used as-is.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory settings
    pub data: DataConfig,

    /// Logging settings
    pub logging: LoggingConfig,

    /// Collector settings
    pub collector: CollectorConfig,
}

/// Data directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Root data directory path
    pub root_dir: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log directory path (relative to data directory or absolute)
    pub log_dir: String,

    /// Default log level (trace, debug, info, warn, error)
    pub default_level: String,

    /// Enable console output
    pub console: bool,

    /// Enable file output
    pub file: bool,

    /// Enable JSON formatting for file logs
    pub json_format: bool,
}

/// Collector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Jikan API base URL
    pub base_url: String,

    /// Maximum attempts for a single logical request
    pub max_retries: u32,

    /// Delay before each retry attempt, in milliseconds
    pub retry_delay_ms: u64,

    /// Base inter-request delay, in milliseconds (429 backoff is twice this)
    pub rate_limit_delay_ms: u64,

    /// Items per page the API serves (informational, never sent as a parameter)
    pub page_size: u32,

    /// How many top-ranked entries to fetch
    pub top_anime_limit: usize,

    /// How many entries get the detail/statistics pass
    pub detail_limit: usize,

    /// How many entries get the review pass
    pub review_anime_limit: usize,

    /// Reviews collected per entry
    pub reviews_per_anime: usize,

    /// Output directory for CSV tables (relative to data directory or absolute)
    pub output_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data: DataConfig {
                root_dir: "data".to_string(),
            },
            logging: LoggingConfig {
                log_dir: "logs".to_string(),
                default_level: "info".to_string(),
                console: true,
                file: true,
                json_format: false,
            },
            collector: CollectorConfig {
                base_url: "https://api.jikan.moe/v4".to_string(),
                max_retries: 3,
                retry_delay_ms: 1000,
                rate_limit_delay_ms: 1000,
                page_size: 25,
                top_anime_limit: 1000,
                detail_limit: 100,
                review_anime_limit: 20,
                reviews_per_anime: 50,
                output_dir: "anime_data".to_string(),
            },
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// If the file doesn't exist, returns the default configuration.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "Config file not found, using defaults"
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content =
            toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Get the absolute path for the data directory
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data.root_dir)
    }

    /// Get the path for the log directory
    pub fn log_dir(&self) -> PathBuf {
        self.resolve(&self.logging.log_dir)
    }

    /// Get the path for the CSV output directory
    pub fn export_dir(&self) -> PathBuf {
        self.resolve(&self.collector.output_dir)
    }

    /// Delay before each retry attempt
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.collector.retry_delay_ms)
    }

    /// Base inter-request delay
    pub fn rate_limit_delay(&self) -> Duration {
        Duration::from_millis(self.collector.rate_limit_delay_ms)
    }

    /// Resolve a configured path relative to the data directory
    fn resolve(&self, configured: &str) -> PathBuf {
        let path = Path::new(configured);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir().join(path)
        }
    }
}

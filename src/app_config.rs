use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use crate::validation::ValidationConfig;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Segmenter and document loading settings
    #[serde(default)]
    pub segmenter: SegmenterConfig,

    /// Merge settings
    #[serde(default)]
    pub merge: MergeConfig,

    /// Quality validation settings
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Directory batch settings
    #[serde(default)]
    pub batch: BatchConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Document loading configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SegmenterConfig {
    // @field: Deepest allowed nesting of embedded values
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

/// Merge configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MergeConfig {
    // @field: Pre-fill new entries with translations found in other documents
    #[serde(default = "default_true")]
    pub reuse_translations: bool,

    // @field: Create empty target files for sources without one
    #[serde(default = "default_true")]
    pub create_missing_targets: bool,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            reuse_translations: true,
            create_missing_targets: true,
        }
    }
}

/// Directory batch configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BatchConfig {
    // @field: Documents processed concurrently
    #[serde(default = "default_concurrent_documents")]
    pub concurrent_documents: usize,

    // @field: Extension of document files
    #[serde(default = "default_file_extension")]
    pub file_extension: String,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrent_documents: default_concurrent_documents(),
            file_extension: default_file_extension(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Matching `log` filter
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_max_depth() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_concurrent_documents() -> usize {
    4
}

fn default_file_extension() -> String {
    "json".to_string()
}

impl Config {
    /// Load a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path.display(), e))?;
        serde_json::from_str(&json)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path.display(), e))
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path.as_ref().display(), e))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.segmenter.max_depth == 0 {
            return Err(anyhow!("segmenter.max_depth must be at least 1"));
        }

        if self.batch.concurrent_documents == 0 {
            return Err(anyhow!("batch.concurrent_documents must be at least 1"));
        }

        if self.batch.file_extension.trim_start_matches('.').is_empty() {
            return Err(anyhow!("batch.file_extension must not be empty"));
        }

        Ok(())
    }
}

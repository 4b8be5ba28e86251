use crate::error::{GeomatchError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default ceiling on the number of chunks a dispatch is split into
pub const DEFAULT_MAX_JOBS: usize = 200;

/// Default lower bound on the number of source features per chunk
pub const DEFAULT_MIN_CHUNK: usize = 20;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Set programmatically by the caller
    Override,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Override => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for matching runs
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    /// Worker threads; 0 runs synchronously on the calling thread
    pub workers: ConfigValue<usize>,
    pub max_jobs: ConfigValue<usize>,
    pub min_chunk: ConfigValue<usize>,
    /// Directory for the worker log file; the working directory when unset
    pub log_dir: ConfigValue<Option<PathBuf>>,
    /// Measure in Mollweide meters instead of raw degrees
    pub to_meters: ConfigValue<bool>,
    /// Keep intersection geometries in the result
    pub keep_geometries: ConfigValue<bool>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            workers: ConfigValue::new(num_cpus::get(), ConfigSource::Default),
            max_jobs: ConfigValue::new(DEFAULT_MAX_JOBS, ConfigSource::Default),
            min_chunk: ConfigValue::new(DEFAULT_MIN_CHUNK, ConfigSource::Default),
            log_dir: ConfigValue::new(None, ConfigSource::Default),
            to_meters: ConfigValue::new(true, ConfigSource::Default),
            keep_geometries: ConfigValue::new(true, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| GeomatchError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| GeomatchError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(workers) = file_config.workers {
            self.workers.update(workers, ConfigSource::File);
        }

        if let Some(max_jobs) = file_config.max_jobs {
            self.max_jobs.update(max_jobs, ConfigSource::File);
        }

        if let Some(min_chunk) = file_config.min_chunk {
            self.min_chunk.update(min_chunk, ConfigSource::File);
        }

        if let Some(log_dir) = file_config.log_dir {
            self.log_dir.update(Some(log_dir), ConfigSource::File);
        }

        if let Some(to_meters) = file_config.to_meters {
            self.to_meters.update(to_meters, ConfigSource::File);
        }

        if let Some(keep_geometries) = file_config.keep_geometries {
            self.keep_geometries.update(keep_geometries, ConfigSource::File);
        }

        self.validate()?;
        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        // GEOMATCH_WORKERS
        if let Ok(workers_str) = env::var("GEOMATCH_WORKERS") {
            match workers_str.trim().parse::<usize>() {
                Ok(workers) => self.workers.update(workers, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid GEOMATCH_WORKERS value '{}': expected a non-negative integer",
                    workers_str
                ),
            }
        }

        // GEOMATCH_MAX_JOBS
        if let Ok(max_jobs_str) = env::var("GEOMATCH_MAX_JOBS") {
            match parse_positive("max_jobs", &max_jobs_str) {
                Ok(max_jobs) => self.max_jobs.update(max_jobs, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid GEOMATCH_MAX_JOBS value '{}': expected a positive integer",
                    max_jobs_str
                ),
            }
        }

        // GEOMATCH_MIN_CHUNK
        if let Ok(min_chunk_str) = env::var("GEOMATCH_MIN_CHUNK") {
            match parse_positive("min_chunk", &min_chunk_str) {
                Ok(min_chunk) => self.min_chunk.update(min_chunk, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid GEOMATCH_MIN_CHUNK value '{}': expected a positive integer",
                    min_chunk_str
                ),
            }
        }

        // GEOMATCH_LOG_DIR
        if let Ok(log_dir) = env::var("GEOMATCH_LOG_DIR") {
            if !log_dir.trim().is_empty() {
                self.log_dir.update(Some(PathBuf::from(log_dir)), ConfigSource::Environment);
            }
        }

        // GEOMATCH_TO_METERS
        if let Ok(to_meters_str) = env::var("GEOMATCH_TO_METERS") {
            match parse_bool("to_meters", &to_meters_str) {
                Ok(to_meters) => self.to_meters.update(to_meters, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid GEOMATCH_TO_METERS value '{}': expected true or false",
                    to_meters_str
                ),
            }
        }

        // GEOMATCH_KEEP_GEOMETRIES
        if let Ok(keep_str) = env::var("GEOMATCH_KEEP_GEOMETRIES") {
            match parse_bool("keep_geometries", &keep_str) {
                Ok(keep) => self.keep_geometries.update(keep, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid GEOMATCH_KEEP_GEOMETRIES value '{}': expected true or false",
                    keep_str
                ),
            }
        }

        self
    }

    /// Apply programmatic overrides, which win over every other source
    pub fn update_from_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(workers) = overrides.workers {
            self.workers.update(workers, ConfigSource::Override);
        }

        if let Some(max_jobs) = overrides.max_jobs {
            self.max_jobs.update(max_jobs, ConfigSource::Override);
        }

        if let Some(min_chunk) = overrides.min_chunk {
            self.min_chunk.update(min_chunk, ConfigSource::Override);
        }

        if let Some(log_dir) = overrides.log_dir {
            self.log_dir.update(Some(log_dir), ConfigSource::Override);
        }

        if let Some(to_meters) = overrides.to_meters {
            self.to_meters.update(to_meters, ConfigSource::Override);
        }

        if let Some(keep_geometries) = overrides.keep_geometries {
            self.keep_geometries.update(keep_geometries, ConfigSource::Override);
        }
    }

    /// Check the partitioning bounds
    pub fn validate(&self) -> Result<()> {
        if self.max_jobs.value == 0 {
            return Err(GeomatchError::ConfigInvalid {
                key: "max_jobs".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.min_chunk.value == 0 {
            return Err(GeomatchError::ConfigInvalid {
                key: "min_chunk".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert("workers".to_string(), (self.workers.value.to_string(), self.workers.source));
        map.insert("max_jobs".to_string(), (self.max_jobs.value.to_string(), self.max_jobs.source));
        map.insert(
            "min_chunk".to_string(),
            (self.min_chunk.value.to_string(), self.min_chunk.source),
        );

        let log_dir = match &self.log_dir.value {
            Some(dir) => dir.display().to_string(),
            None => "(working directory)".to_string(),
        };
        map.insert("log_dir".to_string(), (log_dir, self.log_dir.source));

        map.insert(
            "to_meters".to_string(),
            (self.to_meters.value.to_string(), self.to_meters.source),
        );
        map.insert(
            "keep_geometries".to_string(),
            (self.keep_geometries.value.to_string(), self.keep_geometries.source),
        );

        map
    }
}

impl Default for LayeredConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    workers: Option<usize>,
    max_jobs: Option<usize>,
    min_chunk: Option<usize>,
    log_dir: Option<PathBuf>,
    to_meters: Option<bool>,
    keep_geometries: Option<bool>,
}

/// Programmatic configuration overrides
#[derive(Debug, Default)]
pub struct ConfigOverrides {
    pub workers: Option<usize>,
    pub max_jobs: Option<usize>,
    pub min_chunk: Option<usize>,
    pub log_dir: Option<PathBuf>,
    pub to_meters: Option<bool>,
    pub keep_geometries: Option<bool>,
}

/// Parse a strictly positive integer setting
pub fn parse_positive(key: &str, s: &str) -> Result<usize> {
    match s.trim().parse::<usize>() {
        Ok(0) => Err(GeomatchError::ConfigInvalid {
            key: key.to_string(),
            reason: "must be at least 1".to_string(),
        }),
        Ok(n) => Ok(n),
        Err(e) => Err(GeomatchError::ConfigInvalid {
            key: key.to_string(),
            reason: format!("Invalid integer '{}': {}", s, e),
        }),
    }
}

/// Parse a boolean flag from string
pub fn parse_bool(key: &str, s: &str) -> Result<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(GeomatchError::ConfigInvalid {
            key: key.to_string(),
            reason: format!("Invalid boolean: {}. Use true or false", s),
        }),
    }
}

//! Configuration management for the zonewatch collector
//!
//! Handles loading configuration from a TOML file and environment variables,
//! and provides validation for all configuration settings.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::CollectorError;
use crate::models::{ApiTemplate, Zone};

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "zonewatch.toml";

/// Root configuration structure for the collector
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZonewatchConfig {
    /// Scheduler and worker pool settings
    #[serde(default)]
    pub collector: CollectorConfig,
    /// Weather API configuration
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Zones registered at startup
    #[serde(default)]
    pub zones: Vec<Zone>,
}

/// Scheduler and worker pool settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Seconds between two collection runs
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,
    /// Number of concurrent workers per run
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
}

/// Weather API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Request URL; each zone's latitude and longitude are appended to it
    #[serde(default = "default_api_url_template")]
    pub api_url_template: String,
    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_interval_seconds() -> u64 {
    60
}

fn default_worker_count() -> usize {
    10
}

fn default_api_url_template() -> String {
    "https://api.open-meteo.com/v1/forecast?current=temperature_2m,relative_humidity_2m,rain,precipitation_probability,weather_code&timezone=auto".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("zonewatch/{}", env!("CARGO_PKG_VERSION"))
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval_seconds(),
            worker_count: default_worker_count(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_url_template: default_api_url_template(),
            request_timeout_seconds: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl CollectorConfig {
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

impl WeatherConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl ZonewatchConfig {
    /// Load configuration from `config_path`, or `zonewatch.toml` in the working
    /// directory when none is given, layered under `ZONEWATCH_*` variables
    pub fn load_from_path(config_path: Option<&Path>) -> Result<Self> {
        let config_file = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        let mut builder = Config::builder();

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        } else if config_path.is_some() {
            return Err(CollectorError::config(format!(
                "Config file not found: {}",
                config_file.display()
            ))
            .into());
        }

        // Environment overrides, e.g. ZONEWATCH_COLLECTOR__WORKER_COUNT=4
        builder = builder.add_source(
            Environment::with_prefix("ZONEWATCH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: ZonewatchConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Apply default values to empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.weather.api_url_template.is_empty() {
            self.weather.api_url_template = default_api_url_template();
        }
        if self.weather.user_agent.is_empty() {
            self.weather.user_agent = default_user_agent();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        self.validate_zones()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.collector.worker_count == 0 {
            return Err(CollectorError::config("Worker count must be at least 1").into());
        }

        if self.collector.worker_count > 1000 {
            return Err(CollectorError::config("Worker count cannot exceed 1000").into());
        }

        if self.collector.interval_seconds == 0 {
            return Err(
                CollectorError::config("Collection interval must be at least 1 second").into(),
            );
        }

        if self.weather.request_timeout_seconds == 0 {
            return Err(
                CollectorError::config("Weather API timeout must be at least 1 second").into(),
            );
        }

        if self.weather.request_timeout_seconds > 300 {
            return Err(
                CollectorError::config("Weather API timeout cannot exceed 300 seconds").into(),
            );
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(CollectorError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(CollectorError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        ApiTemplate::parse(&self.weather.api_url_template)?;

        Ok(())
    }

    /// Validate the seed zones
    fn validate_zones(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for zone in &self.zones {
            if !seen.insert(zone.id) {
                return Err(
                    CollectorError::config(format!("Duplicate zone id {}", zone.id)).into(),
                );
            }
            if !zone.has_valid_coordinates() {
                return Err(CollectorError::config(format!(
                    "Zone {} has invalid coordinates: {}",
                    zone.id,
                    zone.format_coordinates()
                ))
                .into());
            }
        }
        Ok(())
    }
}

//! Configuration management for `AirView`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::AirViewError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure for `AirView`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AirViewConfig {
    /// Air quality backend configuration
    pub api: ApiConfig,
    /// Search behaviour
    pub search: SearchConfig,
    /// Severe air quality alerting
    pub alerts: AlertConfig,
    /// Position lookup settings
    pub geolocation: GeolocationConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Air quality backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the backend, without a trailing `/api`
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
}

/// Search behaviour settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Quiet period after the last keystroke before a city search fires
    pub debounce_ms: u64,
    /// Radius for the nearby areas lookup
    pub nearby_radius_km: u32,
}

/// Alert settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// AQI strictly above this value raises a severe alert
    pub severe_threshold: u32,
}

/// Position lookup settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeolocationConfig {
    /// When false, every position request is denied
    pub enabled: bool,
    /// Configured latitude of the current position
    pub latitude: Option<f64>,
    /// Configured longitude of the current position
    pub longitude: Option<f64>,
    /// Upper bound for obtaining a position
    pub timeout_seconds: u32,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
}

fn default_api_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_api_timeout() -> u32 {
    10
}

fn default_debounce_ms() -> u64 {
    800
}

fn default_nearby_radius() -> u32 {
    25
}

fn default_severe_threshold() -> u32 {
    200
}

fn default_geolocation_timeout() -> u32 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
            timeout_seconds: default_api_timeout(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            nearby_radius_km: default_nearby_radius(),
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            severe_threshold: default_severe_threshold(),
        }
    }
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            latitude: None,
            longitude: None,
            timeout_seconds: default_geolocation_timeout(),
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

impl ApiConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }
}

impl SearchConfig {
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl GeolocationConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }
}

impl AirViewConfig {
    /// Load configuration from the default file location and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("airview.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // AIRVIEW_API__BASE_URL, AIRVIEW_ALERTS__SEVERE_THRESHOLD, ...
        builder = builder.add_source(
            Environment::with_prefix("AIRVIEW")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: AirViewConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("airview").join("config.toml"))
    }

    /// Apply default values to empty string fields.
    ///
    /// Numeric values are kept as configured; out-of-range numbers are
    /// rejected by [`AirViewConfig::validate`].
    pub fn apply_defaults(&mut self) {
        if self.api.base_url.is_empty() {
            self.api.base_url = default_api_base_url();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        // Trailing slashes would produce `//api/...` paths
        while self.api.base_url.ends_with('/') {
            self.api.base_url.pop();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_geolocation()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if !(1..=120).contains(&self.api.timeout_seconds) {
            return Err(
                AirViewError::config("API timeout must be between 1 and 120 seconds").into(),
            );
        }

        if !(100..=5000).contains(&self.search.debounce_ms) {
            return Err(AirViewError::config(
                "Search debounce must be between 100 and 5000 milliseconds",
            )
            .into());
        }

        if !(1..=500).contains(&self.search.nearby_radius_km) {
            return Err(AirViewError::config("Nearby radius must be between 1 and 500 km").into());
        }

        if self.alerts.severe_threshold > 500 {
            return Err(AirViewError::config("Severe alert threshold cannot exceed 500").into());
        }

        if !(1..=120).contains(&self.geolocation.timeout_seconds) {
            return Err(AirViewError::config(
                "Geolocation timeout must be between 1 and 120 seconds",
            )
            .into());
        }

        Ok(())
    }

    fn validate_geolocation(&self) -> Result<()> {
        match (self.geolocation.latitude, self.geolocation.longitude) {
            (Some(lat), Some(lon)) => {
                if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                    return Err(AirViewError::config(format!(
                        "Configured position ({lat}, {lon}) is out of range"
                    ))
                    .into());
                }
                Ok(())
            }
            (None, None) => Ok(()),
            _ => Err(AirViewError::config(
                "Geolocation latitude and longitude must be configured together",
            )
            .into()),
        }
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(AirViewError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(AirViewError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://")
        {
            return Err(
                AirViewError::config("API base URL must be a valid HTTP or HTTPS URL").into(),
            );
        }

        Ok(())
    }
}

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::aggregation::structs::Seconds;
use crate::logging::{LoggingConfig, LoggingTomlConfig};
use crate::signal::structs::SignalConfig;
use crate::websocket::types::StreamConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Detector parameters; missing keys take the defaults
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Price granularity of volume profile clusters
    pub price_cluster_size: f64,
    /// Base bucket length (the kline interval subscribed to)
    pub base_interval_secs: Seconds,
    /// Coarse window length, a multiple of the base interval
    pub coarse_window_secs: Seconds,
    /// Buckets required on each side of a pivot
    pub pivot_lookback: usize,
    pub pivot_pool_max_size: usize,
    pub rolling_window_size: usize,
    pub min_levels_swept: usize,
    pub delta_multiplier: f64,
    pub volume_multiplier: f64,
    pub max_confirmation_buckets: u32,
    /// Finalized coarse buckets kept for pivot evaluation
    pub coarse_history_retained: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            price_cluster_size: 10.0,
            base_interval_secs: 60,
            coarse_window_secs: 900,
            pivot_lookback: 3,
            pivot_pool_max_size: 10,
            rolling_window_size: 20,
            min_levels_swept: 2,
            delta_multiplier: 1.5,
            volume_multiplier: 2.0,
            max_confirmation_buckets: 2,
            coarse_history_retained: 100,
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if !(self.price_cluster_size.is_finite() && self.price_cluster_size > 0.0) {
            return invalid(format!("price_cluster_size must be positive, got {}", self.price_cluster_size));
        }
        if self.base_interval_secs == 0 {
            return invalid("base_interval_secs must be positive".to_string());
        }
        if self.coarse_window_secs == 0 || self.coarse_window_secs % self.base_interval_secs != 0 {
            return invalid(format!(
                "coarse_window_secs ({}) must be a positive multiple of base_interval_secs ({})",
                self.coarse_window_secs, self.base_interval_secs
            ));
        }
        if self.pivot_lookback < 1 {
            return invalid("pivot_lookback must be at least 1".to_string());
        }
        if self.pivot_pool_max_size < 1 {
            return invalid("pivot_pool_max_size must be at least 1".to_string());
        }
        if self.rolling_window_size < 2 {
            return invalid(format!("rolling_window_size must be at least 2, got {}", self.rolling_window_size));
        }
        if self.min_levels_swept < 1 {
            return invalid("min_levels_swept must be at least 1".to_string());
        }
        for (name, value) in [
            ("delta_multiplier", self.delta_multiplier),
            ("volume_multiplier", self.volume_multiplier),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return invalid(format!("{} must be positive, got {}", name, value));
            }
        }
        if self.max_confirmation_buckets < 1 {
            return invalid("max_confirmation_buckets must be at least 1".to_string());
        }
        let min_history = 2 * self.pivot_lookback + 1;
        if self.coarse_history_retained < min_history {
            return invalid(format!(
                "coarse_history_retained ({}) must be at least 2 * pivot_lookback + 1 ({})",
                self.coarse_history_retained, min_history
            ));
        }

        Ok(())
    }

    /// Thresholds handed to the signal state machine
    pub fn signal_config(&self) -> SignalConfig {
        SignalConfig {
            min_levels_swept: self.min_levels_swept,
            delta_multiplier: self.delta_multiplier,
            volume_multiplier: self.volume_multiplier,
            max_confirmation_buckets: self.max_confirmation_buckets,
        }
    }

    /// Binance kline interval name of the base bucket
    pub fn kline_interval(&self) -> Result<&'static str, ConfigError> {
        match self.base_interval_secs {
            60 => Ok("1m"),
            180 => Ok("3m"),
            300 => Ok("5m"),
            900 => Ok("15m"),
            1800 => Ok("30m"),
            3600 => Ok("1h"),
            other => Err(ConfigError::Invalid(format!("Unsupported base interval: {}s", other))),
        }
    }
}

/// `[application]` section of config.toml
#[derive(Debug, Clone, Deserialize)]
struct ApplicationConfig {
    pub symbol: String,
}

/// Full TOML configuration structure
#[derive(Debug, Clone, Deserialize)]
struct TomlConfig {
    pub application: ApplicationConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    pub logging: Option<LoggingTomlConfig>,
}

/// Runtime configuration (converted from TOML)
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub symbol: String,
    pub stream: StreamConfig,
    pub detector: DetectorConfig,
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            symbol: "BTCUSDT".to_string(),
            stream: StreamConfig::default(),
            detector: DetectorConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file and validate the detector and stream sections
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let toml_config: TomlConfig = toml::from_str(content)?;
        let config = Self::from_toml_config(toml_config);
        config.detector.validate()?;
        config.stream.validate()?;
        Ok(config)
    }

    fn from_toml_config(toml_config: TomlConfig) -> Self {
        Self {
            symbol: toml_config.application.symbol.to_uppercase(),
            stream: toml_config.stream,
            detector: toml_config.detector,
            logging: toml_config.logging.map(LoggingConfig::from).unwrap_or_default(),
        }
    }
}

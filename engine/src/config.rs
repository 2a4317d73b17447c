//! Configuration for the weather engine
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with FARM_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main engine configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Weather provider and sync configuration
    pub weather: WeatherConfig,

    /// In-process cache configuration
    pub cache: CacheConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WeatherConfig {
    /// Open-Meteo forecast endpoint
    pub base_url: String,

    /// Timezone sent with provider requests
    pub timezone: String,

    /// Days of recent history to request
    pub past_days: u32,

    /// Days of forecast to request
    pub forecast_days: u32,

    /// Fallback coordinate string used when a field resolves nothing else
    pub default_coordinate: Option<String>,

    /// Coordinates batched into one provider request
    pub chunk_size: usize,

    /// Chunks in flight at once during a sync run
    pub max_concurrent_chunks: usize,

    /// Provider request timeout in seconds
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    /// TTL for cached forecasts
    pub forecast_ttl_secs: u64,

    /// TTL for cached water-consumption figures
    pub water_ttl_secs: u64,

    /// Interval between background sweeps of expired entries
    pub sweep_interval_secs: u64,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("FARM_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("weather.base_url", "https://api.open-meteo.com/v1/forecast")?
            .set_default("weather.timezone", "auto")?
            .set_default("weather.past_days", 2)?
            .set_default("weather.forecast_days", 7)?
            .set_default("weather.chunk_size", 8)?
            .set_default("weather.max_concurrent_chunks", 4)?
            .set_default("weather.request_timeout_secs", 30)?
            .set_default("cache.forecast_ttl_secs", 600)?
            .set_default("cache.water_ttl_secs", 180)?
            .set_default("cache.sweep_interval_secs", 600)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (FARM_ prefix)
            .add_source(
                Environment::with_prefix("FARM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

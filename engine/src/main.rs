//! Weather sync entrypoint
//!
//! Runs one ingestion pass over all candidate fields and exits. Intended
//! to be invoked by an external scheduler (cron); there is no daemon mode
//! and no argument surface.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use farm_weather_engine::config::Config;
use farm_weather_engine::external::open_meteo::{FetchOptions, OpenMeteoClient};
use farm_weather_engine::services::cache::{spawn_sweeper, WeatherCache};
use farm_weather_engine::services::coordinates::CoordinateResolver;
use farm_weather_engine::services::sync::WeatherSyncService;
use farm_weather_engine::store::PgWeatherStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "farm_weather_engine=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!("Starting weather sync");
    tracing::info!("Environment: {}", config.environment);

    // Create database connection pool
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.database.url)
        .await?;

    tracing::info!("Database connection established");

    let store = Arc::new(PgWeatherStore::new(db_pool));
    let provider = Arc::new(OpenMeteoClient::new(
        config.weather.base_url.clone(),
        Duration::from_secs(config.weather.request_timeout_secs),
    )?);

    let cache = Arc::new(WeatherCache::new().with_ttls(
        Duration::from_secs(config.cache.forecast_ttl_secs),
        Duration::from_secs(config.cache.water_ttl_secs),
    ));
    let _sweeper = spawn_sweeper(
        cache.clone(),
        Duration::from_secs(config.cache.sweep_interval_secs),
    );

    let options = FetchOptions {
        timezone: config.weather.timezone.clone(),
        past_days: config.weather.past_days,
        forecast_days: config.weather.forecast_days,
        ..FetchOptions::default()
    };
    let resolver = CoordinateResolver::new(config.weather.default_coordinate.clone());

    let sync = WeatherSyncService::new(store, provider, cache, resolver)
        .with_chunking(
            config.weather.chunk_size,
            config.weather.max_concurrent_chunks,
        )
        .with_fetch_options(options);

    let report = sync.sync_fields(None).await?;

    for message in &report.messages {
        tracing::info!("{}", message);
    }
    tracing::info!(
        total = report.total_fields,
        processed = report.processed_fields,
        skipped = report.skipped_fields,
        hourly = report.hourly_upserts,
        daily = report.daily_upserts,
        features = report.feature_upserts,
        "Weather sync finished"
    );

    Ok(())
}

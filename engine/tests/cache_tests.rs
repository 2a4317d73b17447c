//! Weather cache behavior under a real clock and runtime

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use farm_weather_engine::services::cache::{spawn_sweeper, CacheNamespace, WeatherCache};

#[tokio::test]
async fn entry_expires_after_its_ttl() {
    let cache = WeatherCache::new();
    cache.set_with_ttl(
        CacheNamespace::FieldWeather,
        "field-1",
        json!({"temp": 20.1}),
        Duration::from_millis(100),
    );

    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(cache.get(CacheNamespace::FieldWeather, "field-1"), None);
    assert_eq!(cache.stats().size, 0);
}

#[tokio::test]
async fn entry_read_before_expiry_is_intact() {
    let cache = WeatherCache::new();
    let payload = json!({"temp": 20.1, "humidity": 60});
    cache.set_with_ttl(
        CacheNamespace::FieldWeather,
        "field-1",
        payload.clone(),
        Duration::from_secs(60),
    );

    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(
        cache.get(CacheNamespace::FieldWeather, "field-1"),
        Some(payload)
    );
}

#[tokio::test]
async fn background_sweeper_evicts_without_reads() {
    let cache = Arc::new(WeatherCache::new());
    cache.set_with_ttl(
        CacheNamespace::WellWeather,
        "well-1",
        json!(1),
        Duration::from_millis(20),
    );

    let sweeper = spawn_sweeper(cache.clone(), Duration::from_millis(50));
    tokio::time::sleep(Duration::from_millis(150)).await;

    // Nothing read the key, yet the sweep removed it
    assert_eq!(cache.stats().expired, 0);
    assert_eq!(cache.stats().size, 0);

    sweeper.abort();
}

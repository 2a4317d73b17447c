//! In-process TTL cache for weather payloads
//!
//! One map, partitioned by key prefix into logical namespaces with their
//! own default TTLs. Expiry is checked lazily on read (expired entries are
//! evicted as they are touched); a periodic sweep removes what reads never
//! reach. Entries are value copies, never shared mutable state.
//!
//! Known limitation: the cache lives in one process. A multi-process
//! deployment needs an external store in front of it.

use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;

/// Clock seam so tests can drive expiry deterministically
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for tests
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += chrono::Duration::milliseconds(by.as_millis() as i64);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Logical cache namespaces, identified by key prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheNamespace {
    /// Forecast/observation payloads per field
    FieldWeather,
    /// Current conditions per well
    WellWeather,
    /// Ad hoc lookups per raw coordinate
    CoordWeather,
    /// Water-consumption figures per field
    FieldWater,
    /// Water-consumption figures per user
    UserWater,
}

impl CacheNamespace {
    pub const ALL: [CacheNamespace; 5] = [
        CacheNamespace::FieldWeather,
        CacheNamespace::WellWeather,
        CacheNamespace::CoordWeather,
        CacheNamespace::FieldWater,
        CacheNamespace::UserWater,
    ];

    pub fn prefix(&self) -> &'static str {
        match self {
            CacheNamespace::FieldWeather => "weather:field:",
            CacheNamespace::WellWeather => "weather:well:",
            CacheNamespace::CoordWeather => "weather:coord:",
            CacheNamespace::FieldWater => "water:field:",
            CacheNamespace::UserWater => "water:user:",
        }
    }

    /// Build the full key for an id within this namespace
    pub fn key(&self, id: impl Display) -> String {
        format!("{}{}", self.prefix(), id)
    }

    fn is_water(&self) -> bool {
        matches!(self, CacheNamespace::FieldWater | CacheNamespace::UserWater)
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    data: Value,
    timestamp: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

/// Cache observability counters
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    /// Live entries
    pub size: usize,
    /// Entries past their expiry but not yet evicted
    pub expired: usize,
    /// Live entries per namespace prefix
    pub namespaces: HashMap<&'static str, usize>,
}

/// Namespaced TTL cache; inject it where weather data is served
pub struct WeatherCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    clock: Arc<dyn Clock>,
    forecast_ttl: Duration,
    water_ttl: Duration,
}

impl Default for WeatherCache {
    fn default() -> Self {
        Self::new()
    }
}

impl WeatherCache {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
            forecast_ttl: Duration::from_secs(600),
            water_ttl: Duration::from_secs(180),
        }
    }

    /// Override the per-kind default TTLs
    pub fn with_ttls(mut self, forecast: Duration, water: Duration) -> Self {
        self.forecast_ttl = forecast;
        self.water_ttl = water;
        self
    }

    fn ttl_for(&self, namespace: CacheNamespace) -> Duration {
        if namespace.is_water() {
            self.water_ttl
        } else {
            self.forecast_ttl
        }
    }

    /// Store a value copy under the namespace's default TTL
    pub fn set(&self, namespace: CacheNamespace, id: &str, data: Value) {
        self.set_with_ttl(namespace, id, data, self.ttl_for(namespace));
    }

    /// Store a value copy with an explicit TTL
    pub fn set_with_ttl(&self, namespace: CacheNamespace, id: &str, data: Value, ttl: Duration) {
        let now = self.clock.now();
        let entry = CacheEntry {
            data,
            timestamp: now,
            expires_at: now + chrono::Duration::milliseconds(ttl.as_millis() as i64),
        };
        self.entries.lock().insert(namespace.key(id), entry);
    }

    /// Read a value; an expired entry is evicted and reads as absent
    pub fn get(&self, namespace: CacheNamespace, id: &str) -> Option<Value> {
        let key = namespace.key(id);
        let mut entries = self.entries.lock();
        let entry = entries.get(&key)?;
        if entry.expires_at <= self.clock.now() {
            entries.remove(&key);
            return None;
        }
        Some(entry.data.clone())
    }

    /// Age of a live entry, if present
    pub fn age(&self, namespace: CacheNamespace, id: &str) -> Option<Duration> {
        let key = namespace.key(id);
        let entries = self.entries.lock();
        let entry = entries.get(&key)?;
        let now = self.clock.now();
        if entry.expires_at <= now {
            return None;
        }
        (now - entry.timestamp).to_std().ok()
    }

    /// Drop one entry; returns whether it existed
    pub fn delete(&self, namespace: CacheNamespace, id: &str) -> bool {
        self.entries.lock().remove(&namespace.key(id)).is_some()
    }

    /// Drop every entry whose key starts with `prefix`; returns the count
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        before - entries.len()
    }

    /// Remove all expired entries; returns the count
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    /// Size/expiry/namespace counters for observability
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let entries = self.entries.lock();

        let mut namespaces: HashMap<&'static str, usize> = HashMap::new();
        let mut expired = 0;
        for (key, entry) in entries.iter() {
            if entry.expires_at <= now {
                expired += 1;
                continue;
            }
            for namespace in CacheNamespace::ALL {
                if key.starts_with(namespace.prefix()) {
                    *namespaces.entry(namespace.prefix()).or_default() += 1;
                    break;
                }
            }
        }

        CacheStats {
            size: entries.len() - expired,
            expired,
            namespaces,
        }
    }
}

/// Spawn the periodic sweep loop; the handle aborts with the runtime
pub fn spawn_sweeper(cache: Arc<WeatherCache>, interval: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately; skip it
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = cache.sweep();
            if removed > 0 {
                tracing::debug!(removed, "weather cache sweep");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn manual_cache() -> (Arc<ManualClock>, WeatherCache) {
        let clock = Arc::new(ManualClock::starting_at(Utc::now()));
        let cache = WeatherCache::with_clock(clock.clone());
        (clock, cache)
    }

    #[test]
    fn entry_read_before_expiry_returns_stored_value() {
        let (clock, cache) = manual_cache();
        let payload = json!({"temperature": 21.5});
        cache.set_with_ttl(
            CacheNamespace::FieldWeather,
            "field-1",
            payload.clone(),
            Duration::from_millis(100),
        );

        clock.advance(Duration::from_millis(50));
        assert_eq!(
            cache.get(CacheNamespace::FieldWeather, "field-1"),
            Some(payload)
        );
    }

    #[test]
    fn expired_entry_reads_absent_and_is_evicted() {
        let (clock, cache) = manual_cache();
        cache.set_with_ttl(
            CacheNamespace::FieldWeather,
            "field-1",
            json!(1),
            Duration::from_millis(100),
        );

        clock.advance(Duration::from_millis(150));
        assert_eq!(cache.get(CacheNamespace::FieldWeather, "field-1"), None);
        // Evicted on read, not merely hidden
        let stats = cache.stats();
        assert_eq!(stats.size, 0);
        assert_eq!(stats.expired, 0);
    }

    #[test]
    fn namespaces_do_not_collide() {
        let (_clock, cache) = manual_cache();
        cache.set(CacheNamespace::FieldWeather, "1", json!("forecast"));
        cache.set(CacheNamespace::FieldWater, "1", json!("water"));

        assert_eq!(
            cache.get(CacheNamespace::FieldWeather, "1"),
            Some(json!("forecast"))
        );
        assert_eq!(
            cache.get(CacheNamespace::FieldWater, "1"),
            Some(json!("water"))
        );
    }

    #[test]
    fn water_namespaces_use_the_shorter_ttl() {
        let (clock, cache) = manual_cache();
        cache.set(CacheNamespace::FieldWeather, "1", json!(1));
        cache.set(CacheNamespace::UserWater, "1", json!(2));

        // Past the 3-minute water TTL, inside the 10-minute forecast TTL
        clock.advance(Duration::from_secs(200));
        assert!(cache.get(CacheNamespace::FieldWeather, "1").is_some());
        assert!(cache.get(CacheNamespace::UserWater, "1").is_none());
    }

    #[test]
    fn prefix_invalidation_removes_matching_keys() {
        let (_clock, cache) = manual_cache();
        cache.set(CacheNamespace::FieldWeather, "1", json!(1));
        cache.set(CacheNamespace::FieldWeather, "2", json!(2));
        cache.set(CacheNamespace::WellWeather, "1", json!(3));

        let removed = cache.invalidate_prefix(CacheNamespace::FieldWeather.prefix());
        assert_eq!(removed, 2);
        assert!(cache.get(CacheNamespace::FieldWeather, "1").is_none());
        assert!(cache.get(CacheNamespace::WellWeather, "1").is_some());
    }

    #[test]
    fn sweep_removes_only_expired_entries() {
        let (clock, cache) = manual_cache();
        cache.set_with_ttl(
            CacheNamespace::FieldWeather,
            "old",
            json!(1),
            Duration::from_millis(100),
        );
        cache.set_with_ttl(
            CacheNamespace::FieldWeather,
            "fresh",
            json!(2),
            Duration::from_secs(60),
        );

        clock.advance(Duration::from_millis(200));
        assert_eq!(cache.sweep(), 1);
        assert!(cache.get(CacheNamespace::FieldWeather, "fresh").is_some());
    }

    #[test]
    fn stats_report_per_namespace_counts() {
        let (clock, cache) = manual_cache();
        cache.set(CacheNamespace::FieldWeather, "1", json!(1));
        cache.set(CacheNamespace::FieldWeather, "2", json!(2));
        cache.set_with_ttl(
            CacheNamespace::UserWater,
            "1",
            json!(3),
            Duration::from_millis(10),
        );

        clock.advance(Duration::from_millis(50));
        let stats = cache.stats();
        assert_eq!(stats.size, 2);
        assert_eq!(stats.expired, 1);
        assert_eq!(stats.namespaces.get("weather:field:"), Some(&2));
    }

    #[test]
    fn delete_reports_presence() {
        let (_clock, cache) = manual_cache();
        cache.set(CacheNamespace::CoordWeather, "38.57,31.85", json!(1));
        assert!(cache.delete(CacheNamespace::CoordWeather, "38.57,31.85"));
        assert!(!cache.delete(CacheNamespace::CoordWeather, "38.57,31.85"));
    }
}

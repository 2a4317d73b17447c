//! Open-Meteo API client for batched weather fetches
//!
//! One request carries every coordinate of a chunk as comma-joined
//! latitude/longitude lists. The response is validated against the request
//! length (a mismatch fails the whole chunk; partial responses are not
//! trusted) and reshaped into per-location hourly/daily record lists with
//! timezone-aware timestamps. Every reading is sanitized on the way in so
//! malformed upstream values never propagate.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;

use shared::geo::{local_date_of_timestamp, parse_local_date, parse_local_timestamp};
use shared::models::{DailyWeatherRecord, FieldCoordinate, HourlyWeatherRecord};
use shared::numeric::sanitize_reading;

use crate::error::{AppError, AppResult};

/// Hourly variables requested when the caller does not override them
pub const DEFAULT_HOURLY_PARAMS: &[&str] = &[
    "temperature_2m",
    "relative_humidity_2m",
    "precipitation",
    "wind_speed_10m",
    "wind_direction_10m",
    "wind_gusts_10m",
    "shortwave_radiation",
    "et0_fao_evapotranspiration",
    "vapour_pressure_deficit",
    "soil_temperature_0cm",
    "soil_moisture_0_to_1cm",
];

/// Daily variables requested when the caller does not override them
pub const DEFAULT_DAILY_PARAMS: &[&str] = &[
    "temperature_2m_max",
    "temperature_2m_min",
    "precipitation_sum",
    "shortwave_radiation_sum",
    "et0_fao_evapotranspiration",
    "vapour_pressure_deficit_max",
    "precipitation_probability_max",
    "daylight_duration",
];

/// Request options, each independently overridable
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Hourly parameter list, comma-joined into the request
    pub hourly: Vec<String>,
    /// Daily parameter list, comma-joined into the request
    pub daily: Vec<String>,
    /// Timezone parameter; "auto" lets the provider pick per location
    pub timezone: String,
    /// Days of recent history (default 2)
    pub past_days: u32,
    /// Days of forecast (default 7)
    pub forecast_days: u32,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            hourly: DEFAULT_HOURLY_PARAMS.iter().map(|s| s.to_string()).collect(),
            daily: DEFAULT_DAILY_PARAMS.iter().map(|s| s.to_string()).collect(),
            timezone: "auto".to_string(),
            past_days: 2,
            forecast_days: 7,
        }
    }
}

/// Weather for one requested location, reshaped from the raw parallel
/// arrays
#[derive(Debug, Clone)]
pub struct LocationWeather {
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: Option<String>,
    pub utc_offset_seconds: i32,
    pub hourly: Vec<HourlyWeatherRecord>,
    pub daily: Vec<DailyWeatherRecord>,
}

/// Seam over the provider so orchestration can be tested offline
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Fetch weather for every coordinate in one batched request
    async fn fetch_batch(
        &self,
        coordinates: &[FieldCoordinate],
        options: &FetchOptions,
    ) -> AppResult<Vec<LocationWeather>>;
}

/// Open-Meteo HTTP client
#[derive(Clone)]
pub struct OpenMeteoClient {
    client: Client,
    base_url: String,
}

impl OpenMeteoClient {
    /// Create a client against a base URL with a request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Provider(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoClient {
    async fn fetch_batch(
        &self,
        coordinates: &[FieldCoordinate],
        options: &FetchOptions,
    ) -> AppResult<Vec<LocationWeather>> {
        if coordinates.is_empty() {
            return Ok(Vec::new());
        }

        let latitudes = join_values(coordinates.iter().map(|c| c.latitude));
        let longitudes = join_values(coordinates.iter().map(|c| c.longitude));

        tracing::debug!(locations = coordinates.len(), "fetching weather batch");

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("latitude", latitudes.as_str()),
                ("longitude", longitudes.as_str()),
                ("timezone", options.timezone.as_str()),
                ("past_days", options.past_days.to_string().as_str()),
                ("forecast_days", options.forecast_days.to_string().as_str()),
                ("hourly", options.hourly.join(",").as_str()),
                ("daily", options.daily.join(",").as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Provider(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            return Err(AppError::Provider(format!(
                "HTTP {}: {}",
                status,
                truncate(&body, 300)
            )));
        }

        parse_response(coordinates.len(), &body)
    }
}

fn join_values(values: impl Iterator<Item = f64>) -> String {
    values
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn truncate(body: &str, max: usize) -> &str {
    match body.char_indices().nth(max) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

// ---------------------------------------------------------------------------
// Raw response types
// ---------------------------------------------------------------------------

/// The provider answers a single-coordinate request with one object and a
/// multi-coordinate request with an array
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<OmLocation>),
    One(Box<OmLocation>),
}

#[derive(Debug, Deserialize)]
struct OmLocation {
    #[serde(default)]
    latitude: f64,
    #[serde(default)]
    longitude: f64,
    #[serde(default)]
    timezone: Option<String>,
    #[serde(default)]
    utc_offset_seconds: i32,
    #[serde(default)]
    hourly: Option<OmHourly>,
    #[serde(default)]
    daily: Option<OmDaily>,
}

#[derive(Debug, Default, Deserialize)]
struct OmHourly {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    relative_humidity_2m: Vec<Option<f64>>,
    #[serde(default)]
    precipitation: Vec<Option<f64>>,
    #[serde(default)]
    wind_speed_10m: Vec<Option<f64>>,
    #[serde(default)]
    wind_direction_10m: Vec<Option<f64>>,
    #[serde(default)]
    wind_gusts_10m: Vec<Option<f64>>,
    #[serde(default)]
    shortwave_radiation: Vec<Option<f64>>,
    #[serde(default)]
    et0_fao_evapotranspiration: Vec<Option<f64>>,
    #[serde(default)]
    vapour_pressure_deficit: Vec<Option<f64>>,
    #[serde(default)]
    soil_temperature_0cm: Vec<Option<f64>>,
    #[serde(default)]
    soil_moisture_0_to_1cm: Vec<Option<f64>>,
}

#[derive(Debug, Default, Deserialize)]
struct OmDaily {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
    #[serde(default)]
    shortwave_radiation_sum: Vec<Option<f64>>,
    #[serde(default)]
    et0_fao_evapotranspiration: Vec<Option<f64>>,
    #[serde(default)]
    vapour_pressure_deficit_max: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_probability_max: Vec<Option<f64>>,
    #[serde(default)]
    daylight_duration: Vec<Option<f64>>,
}

/// Parse and validate a raw response body against the request size
pub(crate) fn parse_response(expected: usize, body: &str) -> AppResult<Vec<LocationWeather>> {
    let parsed: OneOrMany = serde_json::from_str(body)
        .map_err(|e| AppError::Provider(format!("failed to parse response: {e}")))?;

    let locations = match parsed {
        OneOrMany::Many(locations) => locations,
        OneOrMany::One(location) => vec![*location],
    };

    if locations.len() != expected {
        return Err(AppError::ProviderShape {
            expected,
            actual: locations.len(),
        });
    }

    Ok(locations.into_iter().map(reshape_location).collect())
}

fn reshape_location(raw: OmLocation) -> LocationWeather {
    let offset = raw.utc_offset_seconds;

    let mut hourly = Vec::new();
    // Max hourly VPD per local calendar day, for the daily backfill
    let mut vpd_by_day: HashMap<NaiveDate, f64> = HashMap::new();

    if let Some(h) = &raw.hourly {
        for (i, time) in h.time.iter().enumerate() {
            let Some(timestamp) = parse_local_timestamp(time, offset) else {
                continue;
            };

            let mut record = HourlyWeatherRecord::at(timestamp);
            record.temperature_celsius = reading(&h.temperature_2m, i);
            record.relative_humidity_percent = reading(&h.relative_humidity_2m, i);
            record.precipitation_mm = reading(&h.precipitation, i);
            record.wind_speed_kmh = reading(&h.wind_speed_10m, i);
            record.wind_direction_deg = reading(&h.wind_direction_10m, i);
            record.wind_gusts_kmh = reading(&h.wind_gusts_10m, i);
            record.shortwave_radiation_wm2 = reading(&h.shortwave_radiation, i);
            record.et0_mm = reading(&h.et0_fao_evapotranspiration, i);
            record.vapour_pressure_deficit_kpa = reading(&h.vapour_pressure_deficit, i);
            record.soil_temperature_celsius = reading(&h.soil_temperature_0cm, i);
            record.soil_moisture = reading(&h.soil_moisture_0_to_1cm, i);

            if let (Some(day), Some(vpd)) = (
                local_date_of_timestamp(time),
                record.vapour_pressure_deficit_kpa,
            ) {
                let entry = vpd_by_day.entry(day).or_insert(vpd);
                if vpd > *entry {
                    *entry = vpd;
                }
            }

            hourly.push(record);
        }
    }

    let mut daily = Vec::new();
    if let Some(d) = &raw.daily {
        for (i, time) in d.time.iter().enumerate() {
            let Some(date) = parse_local_date(time) else {
                continue;
            };

            let mut record = DailyWeatherRecord::on(date);
            record.temp_max_celsius = reading(&d.temperature_2m_max, i);
            record.temp_min_celsius = reading(&d.temperature_2m_min, i);
            record.precipitation_sum_mm = reading(&d.precipitation_sum, i);
            record.shortwave_radiation_sum_mj = reading(&d.shortwave_radiation_sum, i);
            record.et0_mm = reading(&d.et0_fao_evapotranspiration, i);
            record.rainfall_probability_percent = reading(&d.precipitation_probability_max, i);
            record.daylight_seconds = reading(&d.daylight_duration, i);
            // Backfill from hourly VPD when the daily maximum is absent,
            // using the location's own calendar day
            record.vpd_max_kpa = reading(&d.vapour_pressure_deficit_max, i)
                .or_else(|| vpd_by_day.get(&date).copied());

            daily.push(record);
        }
    }

    LocationWeather {
        latitude: raw.latitude,
        longitude: raw.longitude,
        timezone: raw.timezone,
        utc_offset_seconds: offset,
        hourly,
        daily,
    }
}

fn reading(values: &[Option<f64>], index: usize) -> Option<f64> {
    sanitize_reading(values.get(index).copied().flatten())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn single_location_body() -> String {
        serde_json::json!({
            "latitude": 38.57,
            "longitude": 31.85,
            "timezone": "Europe/Istanbul",
            "utc_offset_seconds": 10800,
            "hourly": {
                "time": ["2024-05-14T00:00", "2024-05-14T01:00", "2024-05-14T02:00"],
                "temperature_2m": [12.3456789, null, 11.0],
                "vapour_pressure_deficit": [0.4, 0.9, 0.7]
            },
            "daily": {
                "time": ["2024-05-14"],
                "temperature_2m_max": [24.5],
                "temperature_2m_min": [9.5],
                "precipitation_sum": [0.0]
            }
        })
        .to_string()
    }

    #[test]
    fn single_object_response_accepted() {
        let locations = parse_response(1, &single_location_body()).unwrap();
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].utc_offset_seconds, 10800);
        assert_eq!(locations[0].hourly.len(), 3);
        assert_eq!(locations[0].daily.len(), 1);
    }

    #[test]
    fn array_response_accepted() {
        let body = format!("[{0},{0}]", single_location_body());
        let locations = parse_response(2, &body).unwrap();
        assert_eq!(locations.len(), 2);
    }

    #[test]
    fn shape_mismatch_fails_the_chunk() {
        let body = format!("[{}]", single_location_body());
        let err = parse_response(2, &body).unwrap_err();
        match err {
            AppError::ProviderShape { expected, actual } => {
                assert_eq!(expected, 2);
                assert_eq!(actual, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn timestamps_converted_with_location_offset() {
        let locations = parse_response(1, &single_location_body()).unwrap();
        // 00:00 local at UTC+3 is 21:00 UTC the previous evening
        assert_eq!(locations[0].hourly[0].timestamp.hour(), 21);
    }

    #[test]
    fn readings_rounded_and_nulls_absent() {
        let locations = parse_response(1, &single_location_body()).unwrap();
        let hourly = &locations[0].hourly;
        assert_eq!(hourly[0].temperature_celsius, Some(12.3457));
        assert_eq!(hourly[1].temperature_celsius, None);
        // Variables never requested stay absent rather than defaulting
        assert_eq!(hourly[0].wind_speed_kmh, None);
    }

    #[test]
    fn daily_vpd_backfilled_from_hourly_maximum() {
        let locations = parse_response(1, &single_location_body()).unwrap();
        assert_eq!(locations[0].daily[0].vpd_max_kpa, Some(0.9));
    }

    #[test]
    fn daily_vpd_prefers_provider_value() {
        let body = serde_json::json!({
            "latitude": 38.57,
            "longitude": 31.85,
            "utc_offset_seconds": 0,
            "hourly": {
                "time": ["2024-05-14T00:00"],
                "vapour_pressure_deficit": [2.5]
            },
            "daily": {
                "time": ["2024-05-14"],
                "vapour_pressure_deficit_max": [1.8]
            }
        })
        .to_string();

        let locations = parse_response(1, &body).unwrap();
        assert_eq!(locations[0].daily[0].vpd_max_kpa, Some(1.8));
    }

    #[test]
    fn garbage_body_is_a_provider_error() {
        let err = parse_response(1, "not json").unwrap_err();
        assert!(matches!(err, AppError::Provider(_)));
    }

    #[test]
    fn default_params_cover_the_full_record() {
        let options = FetchOptions::default();
        assert_eq!(options.hourly.len(), 11);
        assert_eq!(options.daily.len(), 8);
        assert_eq!(options.past_days, 2);
        assert_eq!(options.forecast_days, 7);
    }
}

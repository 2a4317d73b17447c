//! Weather observation models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Resolved coordinate for one field, the input unit of a batched provider
/// request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldCoordinate {
    pub field_id: Uuid,
    pub field_name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// One hourly observation
///
/// Every reading is optional; the provider may omit any of them. Immutable
/// once persisted, keyed by `(field_id, timestamp, source)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HourlyWeatherRecord {
    pub timestamp: DateTime<Utc>,
    pub temperature_celsius: Option<f64>,
    pub relative_humidity_percent: Option<f64>,
    pub precipitation_mm: Option<f64>,
    pub wind_speed_kmh: Option<f64>,
    pub wind_direction_deg: Option<f64>,
    pub wind_gusts_kmh: Option<f64>,
    pub shortwave_radiation_wm2: Option<f64>,
    pub et0_mm: Option<f64>,
    pub vapour_pressure_deficit_kpa: Option<f64>,
    pub soil_temperature_celsius: Option<f64>,
    pub soil_moisture: Option<f64>,
}

impl HourlyWeatherRecord {
    /// An empty record at a timestamp, readings filled in by the parser
    pub fn at(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            temperature_celsius: None,
            relative_humidity_percent: None,
            precipitation_mm: None,
            wind_speed_kmh: None,
            wind_direction_deg: None,
            wind_gusts_kmh: None,
            shortwave_radiation_wm2: None,
            et0_mm: None,
            vapour_pressure_deficit_kpa: None,
            soil_temperature_celsius: None,
            soil_moisture: None,
        }
    }
}

/// One daily summary derived from the provider's daily arrays
///
/// Keyed by `(field_id, date, source)`. `vpd_max_kpa` may be back-filled
/// from the maximum of the same local calendar day's hourly VPD when the
/// daily field is absent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyWeatherRecord {
    pub date: NaiveDate,
    pub temp_max_celsius: Option<f64>,
    pub temp_min_celsius: Option<f64>,
    pub precipitation_sum_mm: Option<f64>,
    pub shortwave_radiation_sum_mj: Option<f64>,
    pub et0_mm: Option<f64>,
    pub vpd_max_kpa: Option<f64>,
    pub rainfall_probability_percent: Option<f64>,
    pub daylight_seconds: Option<f64>,
}

impl DailyWeatherRecord {
    /// An empty summary for a date, fields filled in by the parser
    pub fn on(date: NaiveDate) -> Self {
        Self {
            date,
            temp_max_celsius: None,
            temp_min_celsius: None,
            precipitation_sum_mm: None,
            shortwave_radiation_sum_mj: None,
            et0_mm: None,
            vpd_max_kpa: None,
            rainfall_probability_percent: None,
            daylight_seconds: None,
        }
    }
}

/// Transient current conditions for one well, used only for display-side
/// summaries and never persisted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CurrentConditions {
    pub timestamp: DateTime<Utc>,
    pub temperature_celsius: Option<f64>,
    pub relative_humidity_percent: Option<f64>,
}

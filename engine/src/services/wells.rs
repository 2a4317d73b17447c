//! Nearest-well resolution and well weather summaries

use std::cmp::Ordering;

use serde::Serialize;
use uuid::Uuid;

use shared::geo::haversine_km;
use shared::models::{CurrentConditions, Well};
use shared::types::GpsCoordinates;

/// Beyond this distance a well's weather is a worse proxy than the
/// field's own coordinates
pub const MAX_WELL_DISTANCE_KM: f64 = 5.0;

/// Nearest linked well with a known coordinate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearestWell {
    pub well_id: Uuid,
    pub well_name: String,
    pub distance_km: f64,
}

/// Pick the closest well to a field among the wells that have both
/// latitude and longitude
pub fn nearest_well(field: GpsCoordinates, wells: &[Well]) -> Option<NearestWell> {
    wells
        .iter()
        .filter_map(|well| {
            let latitude = well.latitude?;
            let longitude = well.longitude?;
            let distance = haversine_km(field, GpsCoordinates::new(latitude, longitude));
            Some((well, distance))
        })
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
        .map(|(well, distance_km)| NearestWell {
            well_id: well.id,
            well_name: well.name.clone(),
            distance_km,
        })
}

/// Which coordinate should source a field's weather
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherSourcePolicy {
    FieldCoordinates,
    NearestWell,
}

/// Prefer the nearest well only when it is close enough to stand in for
/// the field
pub fn weather_source_policy(field: GpsCoordinates, wells: &[Well]) -> WeatherSourcePolicy {
    match nearest_well(field, wells) {
        Some(nearest) if nearest.distance_km <= MAX_WELL_DISTANCE_KM => {
            WeatherSourcePolicy::NearestWell
        }
        _ => WeatherSourcePolicy::FieldCoordinates,
    }
}

/// Display-only aggregate of current conditions across a user's wells;
/// never persisted
#[derive(Debug, Clone, Serialize)]
pub struct WellWeatherSummary {
    pub well_count: usize,
    pub reporting_wells: usize,
    pub avg_temperature_celsius: Option<f64>,
    pub avg_relative_humidity_percent: Option<f64>,
}

/// Average temperature/humidity over the wells that reported conditions
pub fn summarize_well_conditions(
    well_count: usize,
    conditions: &[CurrentConditions],
) -> WellWeatherSummary {
    WellWeatherSummary {
        well_count,
        reporting_wells: conditions.len(),
        avg_temperature_celsius: average(conditions.iter().map(|c| c.temperature_celsius)),
        avg_relative_humidity_percent: average(
            conditions.iter().map(|c| c.relative_humidity_percent),
        ),
    }
}

fn average(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let present: Vec<f64> = values.flatten().collect();
    if present.is_empty() {
        return None;
    }
    Some(present.iter().sum::<f64>() / present.len() as f64)
}

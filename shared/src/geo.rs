//! Geometry helpers: coordinate-string parsing, great-circle distance and
//! offset-aware timestamp parsing

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

use crate::types::GpsCoordinates;

/// Mean Earth radius in kilometres
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Parse a raw coordinate string into a lat/lon pair.
///
/// Accepts two floats separated by comma, semicolon, pipe or whitespace;
/// tokens after the first two are ignored. Returns `None` when fewer than
/// two tokens are present or either of the first two is not a finite
/// number — malformed input is absence, not an error.
pub fn parse_coordinate_pair(raw: &str) -> Option<GpsCoordinates> {
    let mut tokens = raw
        .split(|c: char| matches!(c, ',' | ';' | '|') || c.is_whitespace())
        .filter(|t| !t.is_empty());

    let latitude = parse_finite(tokens.next()?)?;
    let longitude = parse_finite(tokens.next()?)?;
    Some(GpsCoordinates::new(latitude, longitude))
}

fn parse_finite(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Great-circle (Haversine) distance between two points, in kilometres
pub fn haversine_km(a: GpsCoordinates, b: GpsCoordinates) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Parse a provider-local naive timestamp (`2024-05-14T13:00`) into an
/// absolute instant using the location's UTC offset in seconds.
///
/// The offset is the location's, never the caller's local time zone.
pub fn parse_local_timestamp(raw: &str, utc_offset_seconds: i32) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()?;
    let utc = naive - Duration::seconds(i64::from(utc_offset_seconds));
    Some(DateTime::<Utc>::from_naive_utc_and_offset(utc, Utc))
}

/// Parse a provider date string (`2024-05-14`)
pub fn parse_local_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Calendar date of a naive provider timestamp, in the location's own
/// calendar (the date component before any offset conversion)
pub fn local_date_of_timestamp(raw: &str) -> Option<NaiveDate> {
    raw.get(..10).and_then(parse_local_date)
}

//! Common types used across the weather engine

use serde::{Deserialize, Serialize};

/// GPS coordinates in decimal degrees
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GpsCoordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsCoordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Which step of the fallback chain produced a field's coordinate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateSource {
    /// Parsed from the field's own coordinate string
    Field,
    /// Taken from a linked well, identified by name
    Well { name: String },
    /// Configured or hard-coded default
    Default,
}

impl CoordinateSource {
    /// Human-readable label for sync messages and logs
    pub fn label(&self) -> &str {
        match self {
            CoordinateSource::Field => "field",
            CoordinateSource::Well { name } => name,
            CoordinateSource::Default => "default",
        }
    }
}

/// Outcome of the coordinate fallback chain for one field
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolvedCoordinate {
    pub coordinates: GpsCoordinates,
    pub source: CoordinateSource,
}

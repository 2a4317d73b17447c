//! Coordinate resolution for fields
//!
//! Priority order, first match wins: the field's own coordinate string,
//! the first linked well with a full coordinate, the configured default,
//! the hard-coded fallback. Parse failures count as absence; resolution
//! itself never fails the sync.

use shared::geo::parse_coordinate_pair;
use shared::models::{FieldWithContext, Well};
use shared::types::{CoordinateSource, GpsCoordinates, ResolvedCoordinate};

/// Coordinate used when nothing else is configured (Akşehir district)
pub const FALLBACK_COORDINATE: &str = "38.57,31.85";

/// Resolver with the configured default coordinate injected
#[derive(Debug, Clone, Default)]
pub struct CoordinateResolver {
    default_coordinate: Option<String>,
}

impl CoordinateResolver {
    pub fn new(default_coordinate: Option<String>) -> Self {
        Self {
            default_coordinate,
        }
    }

    /// Walk the fallback chain for one field.
    ///
    /// Returns `None` only when every strategy, the hard-coded fallback
    /// included, yields nothing; callers skip and count such fields.
    pub fn resolve(&self, candidate: &FieldWithContext) -> Option<ResolvedCoordinate> {
        from_field_string(candidate.field.coordinates.as_deref())
            .or_else(|| from_wells(&candidate.wells))
            .or_else(|| self.from_default())
    }

    fn from_default(&self) -> Option<ResolvedCoordinate> {
        let coordinates = self
            .default_coordinate
            .as_deref()
            .and_then(parse_coordinate_pair)
            .or_else(|| parse_coordinate_pair(FALLBACK_COORDINATE))?;

        Some(ResolvedCoordinate {
            coordinates,
            source: CoordinateSource::Default,
        })
    }
}

fn from_field_string(raw: Option<&str>) -> Option<ResolvedCoordinate> {
    let coordinates = raw.and_then(parse_coordinate_pair)?;
    Some(ResolvedCoordinate {
        coordinates,
        source: CoordinateSource::Field,
    })
}

/// First linked well (stable insertion order) with both latitude and
/// longitude set
fn from_wells(wells: &[Well]) -> Option<ResolvedCoordinate> {
    wells.iter().find_map(|well| {
        let latitude = well.latitude?;
        let longitude = well.longitude?;
        Some(ResolvedCoordinate {
            coordinates: GpsCoordinates::new(latitude, longitude),
            source: CoordinateSource::Well {
                name: well.name.clone(),
            },
        })
    })
}

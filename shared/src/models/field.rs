//! Field, well and crop models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A cultivated field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    pub id: Uuid,
    pub name: String,
    /// Raw coordinate string as entered by the farmer ("lat,lon" and close
    /// variants); parsed lazily by the coordinate resolver
    pub coordinates: Option<String>,
    /// Area in decares (1 decare = 1,000 m²)
    pub area_decares: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A well linked to one or more fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Well {
    pub id: Uuid,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// A crop growing on a field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldCrop {
    pub id: Uuid,
    pub name: String,
    pub planting_date: Option<NaiveDate>,
}

/// Candidate field for a sync run: the field plus its linked wells (stable
/// insertion order) and its single most recent actively-growing crop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldWithContext {
    pub field: Field,
    pub wells: Vec<Well>,
    pub active_crop: Option<FieldCrop>,
}

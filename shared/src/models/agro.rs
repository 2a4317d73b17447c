//! Derived agronomic feature models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Crop life-cycle phase driving the crop coefficient used in ETc
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PhenologyStage {
    Initial,
    Development,
    Mid,
    Late,
}

impl PhenologyStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhenologyStage::Initial => "initial",
            PhenologyStage::Development => "development",
            PhenologyStage::Mid => "mid",
            PhenologyStage::Late => "late",
        }
    }

    /// Parse the persisted stage name
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "initial" => Some(PhenologyStage::Initial),
            "development" => Some(PhenologyStage::Development),
            "mid" => Some(PhenologyStage::Mid),
            "late" => Some(PhenologyStage::Late),
            _ => None,
        }
    }
}

impl std::fmt::Display for PhenologyStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One field-day of derived agronomic indicators
///
/// The stateful entity of the engine: cumulative fields and the water
/// balance add the day's delta to the previous feature row the store
/// returns for the same field. Keyed by `(field_id, date)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgroFeatureDaily {
    pub field_id: Uuid,
    pub date: NaiveDate,
    pub crop_id: Option<Uuid>,
    pub gdd: Option<f64>,
    pub gdd_cumulative: Option<f64>,
    pub etc_mm: Option<f64>,
    pub etc_cumulative: Option<f64>,
    pub water_balance_mm: Option<f64>,
    pub rainfall_mm: Option<f64>,
    /// Always 0 until the irrigation workflows feed real applications in
    pub irrigation_mm: f64,
    pub vpd_max_kpa: Option<f64>,
    pub heat_stress_hours: i32,
    pub frost_hours: i32,
    pub phenology_stage: Option<PhenologyStage>,
    pub recommendations: Vec<String>,
    pub metadata: serde_json::Value,
}

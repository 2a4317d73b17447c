//! Daily agro-metrics computation
//!
//! A pure function from one day's weather, the field's crop state and the
//! previous day's cumulative feature to a new feature row with rule-based
//! recommendations. The previous feature is whatever the store returned;
//! date adjacency is not validated, only recorded in the row's metadata.

use serde_json::json;
use uuid::Uuid;

use shared::models::{
    AgroFeatureDaily, DailyWeatherRecord, FieldCrop, HourlyWeatherRecord, PhenologyStage,
};
use shared::numeric::round4;

use super::crops::{find_crop_guide, CropGuide, DEFAULT_GUIDE, GENERIC_KC};

/// ETc must exceed water input by this factor before an irrigation note
const IRRIGATION_DEFICIT_FACTOR: f64 = 1.2;
/// ...and be at least this many millimetres
const IRRIGATION_MIN_ETC_MM: f64 = 2.0;
/// Stressful hours tolerated before a heat note
const HEAT_NOTE_MIN_HOURS: i32 = 2;
/// Window around a GDD milestone that triggers a phenology note
const MILESTONE_WINDOW_GDD: f64 = 80.0;
/// Late-stage water balance below this raises a deficit warning
const LATE_STAGE_DEFICIT_MM: f64 = -30.0;

/// Inputs for one field-day computation
#[derive(Debug)]
pub struct DailyComputation<'a> {
    pub field_id: Uuid,
    pub daily: &'a DailyWeatherRecord,
    /// Hourly records belonging to the same local calendar day
    pub hourly: &'a [HourlyWeatherRecord],
    pub crop: Option<&'a FieldCrop>,
    /// Most recent stored feature for the field, the carry-forward basis
    pub previous: Option<&'a AgroFeatureDaily>,
}

/// Compute the derived agro feature for one field-day
pub fn compute_daily_feature(input: &DailyComputation<'_>) -> AgroFeatureDaily {
    let guide: &CropGuide = input
        .crop
        .and_then(|crop| find_crop_guide(&crop.name))
        .unwrap_or(&DEFAULT_GUIDE);

    let days_after_planting = input
        .crop
        .and_then(|crop| crop.planting_date)
        .map(|planted| (input.daily.date - planted).num_days());

    let phenology_stage = days_after_planting.and_then(|days| guide.stage_for_day(days));

    // GDD: average of tMax/tMin clamped into the crop's thermal window.
    // Either bound missing means no reading today and the cumulative is
    // inherited unchanged.
    let avg_temp = match (input.daily.temp_max_celsius, input.daily.temp_min_celsius) {
        (Some(t_max), Some(t_min)) => Some((t_max + t_min) / 2.0),
        _ => None,
    };
    let gdd = avg_temp
        .map(|t| round4((t.clamp(guide.base_temp, guide.upper_temp) - guide.base_temp).max(0.0)));
    let gdd_cumulative = carry_forward(
        gdd,
        input.previous.and_then(|p| p.gdd_cumulative),
    );

    // ETc = Kc(stage) × ET0
    let kc = phenology_stage
        .map(|stage| guide.kc_for_stage(stage))
        .unwrap_or(GENERIC_KC);
    let etc_mm = input.daily.et0_mm.map(|et0| round4(kc * et0));
    let etc_cumulative = carry_forward(
        etc_mm,
        input.previous.and_then(|p| p.etc_cumulative),
    );

    // Water balance: previous + rainfall + irrigation − ETc
    let rainfall_mm = input.daily.precipitation_sum_mm;
    let irrigation_mm = 0.0;
    let previous_balance = input.previous.and_then(|p| p.water_balance_mm);
    let water_balance_mm = if rainfall_mm.is_some() || etc_mm.is_some() {
        Some(round4(
            previous_balance.unwrap_or(0.0) + rainfall_mm.unwrap_or(0.0) + irrigation_mm
                - etc_mm.unwrap_or(0.0),
        ))
    } else {
        previous_balance
    };

    let heat_stress_hours = count_hours(input.hourly, |t| t >= guide.heat_stress_temp);
    let frost_hours = count_hours(input.hourly, |t| t <= guide.frost_temp);

    let vpd_max_kpa = input
        .daily
        .vpd_max_kpa
        .or_else(|| {
            input
                .hourly
                .iter()
                .filter_map(|h| h.vapour_pressure_deficit_kpa)
                .fold(None, |acc: Option<f64>, v| {
                    Some(acc.map_or(v, |a| a.max(v)))
                })
        })
        .map(round4);

    let mut recommendations = Vec::new();

    if let Some(etc) = etc_mm {
        let supply = rainfall_mm.unwrap_or(0.0) + irrigation_mm;
        if etc > IRRIGATION_MIN_ETC_MM && etc > supply * IRRIGATION_DEFICIT_FACTOR {
            push_unique(
                &mut recommendations,
                format!(
                    "Irrigation recommended: crop water use {etc:.1} mm exceeds water input {supply:.1} mm"
                ),
            );
        }
    }

    if heat_stress_hours > HEAT_NOTE_MIN_HOURS {
        push_unique(
            &mut recommendations,
            format!(
                "Heat stress: {heat_stress_hours} hours at or above {:.0} °C",
                guide.heat_stress_temp
            ),
        );
    }

    if let Some(vpd) = vpd_max_kpa {
        if vpd > guide.vpd_stress_kpa {
            push_unique(
                &mut recommendations,
                format!(
                    "High atmospheric demand: max VPD {vpd:.2} kPa above the {:.1} kPa threshold",
                    guide.vpd_stress_kpa
                ),
            );
        }
    }

    if frost_hours > 0 {
        push_unique(
            &mut recommendations,
            format!(
                "Frost risk: {frost_hours} hours at or below {:.0} °C",
                guide.frost_temp
            ),
        );
    }

    if let Some(cumulative) = gdd_cumulative {
        for (milestone, target) in guide.gdd_milestones {
            if (target - cumulative).abs() <= MILESTONE_WINDOW_GDD {
                push_unique(
                    &mut recommendations,
                    format!(
                        "Phenology milestone: {milestone} expected around {target:.0} GDD (currently {cumulative:.0})"
                    ),
                );
            }
        }
    }

    if phenology_stage == Some(PhenologyStage::Late) {
        if let Some(balance) = water_balance_mm {
            if balance < LATE_STAGE_DEFICIT_MM {
                push_unique(
                    &mut recommendations,
                    format!(
                        "Late-stage water deficit: balance {balance:.0} mm, yield risk without irrigation"
                    ),
                );
            }
        }
    }

    let metadata = json!({
        "crop_guide": guide.name,
        "kc": kc,
        "days_after_planting": days_after_planting,
        "previous_feature_date": input.previous.map(|p| p.date),
    });

    AgroFeatureDaily {
        field_id: input.field_id,
        date: input.daily.date,
        crop_id: input.crop.map(|c| c.id),
        gdd,
        gdd_cumulative,
        etc_mm,
        etc_cumulative,
        water_balance_mm,
        rainfall_mm,
        irrigation_mm,
        vpd_max_kpa,
        heat_stress_hours,
        frost_hours,
        phenology_stage,
        recommendations,
        metadata,
    }
}

/// Add today's delta to the carried cumulative; without a fresh reading
/// the cumulative is inherited unchanged, and the previous defaults to 0
/// only when a fresh reading exists
fn carry_forward(today: Option<f64>, previous_cumulative: Option<f64>) -> Option<f64> {
    match today {
        Some(delta) => Some(round4(previous_cumulative.unwrap_or(0.0) + delta)),
        None => previous_cumulative,
    }
}

fn count_hours(hourly: &[HourlyWeatherRecord], predicate: impl Fn(f64) -> bool) -> i32 {
    hourly
        .iter()
        .filter(|h| h.temperature_celsius.map(&predicate).unwrap_or(false))
        .count() as i32
}

fn push_unique(recommendations: &mut Vec<String>, message: String) {
    if !recommendations.iter().any(|m| m == &message) {
        recommendations.push(message);
    }
}

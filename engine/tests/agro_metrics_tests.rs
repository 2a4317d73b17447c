//! Property-based tests for the agro-metrics calculator

use chrono::NaiveDate;
use proptest::prelude::*;
use uuid::Uuid;

use farm_weather_engine::services::crops::find_crop_guide;
use farm_weather_engine::services::metrics::{compute_daily_feature, DailyComputation};
use shared::models::{AgroFeatureDaily, DailyWeatherRecord, FieldCrop};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn daily_record(t_max: f64, t_min: f64, et0: Option<f64>, rain: Option<f64>) -> DailyWeatherRecord {
    let mut record = DailyWeatherRecord::on(date(2024, 5, 14));
    record.temp_max_celsius = Some(t_max);
    record.temp_min_celsius = Some(t_min);
    record.et0_mm = et0;
    record.precipitation_sum_mm = rain;
    record
}

fn previous_feature(gdd_cumulative: f64, balance: f64) -> AgroFeatureDaily {
    AgroFeatureDaily {
        field_id: Uuid::new_v4(),
        date: date(2024, 5, 13),
        crop_id: None,
        gdd: None,
        gdd_cumulative: Some(gdd_cumulative),
        etc_mm: None,
        etc_cumulative: None,
        water_balance_mm: Some(balance),
        rainfall_mm: None,
        irrigation_mm: 0.0,
        vpd_max_kpa: None,
        heat_stress_hours: 0,
        frost_hours: 0,
        phenology_stage: None,
        recommendations: Vec::new(),
        metadata: serde_json::Value::Null,
    }
}

proptest! {
    /// Daily GDD is bounded by the crop's thermal window
    #[test]
    fn gdd_stays_within_the_thermal_window(
        t_max in -30.0f64..60.0,
        t_min in -30.0f64..60.0,
    ) {
        let wheat = FieldCrop {
            id: Uuid::new_v4(),
            name: "wheat".to_string(),
            planting_date: None,
        };
        let guide = find_crop_guide("wheat").unwrap();
        let record = daily_record(t_max, t_min, None, None);

        let feature = compute_daily_feature(&DailyComputation {
            field_id: Uuid::new_v4(),
            daily: &record,
            hourly: &[],
            crop: Some(&wheat),
            previous: None,
        });

        let gdd = feature.gdd.unwrap();
        prop_assert!(gdd >= 0.0);
        prop_assert!(gdd <= guide.upper_temp - guide.base_temp);
    }

    /// Cumulative GDD is exactly previous + today's delta
    #[test]
    fn cumulative_gdd_is_additive(
        t_max in -10.0f64..45.0,
        t_min in -10.0f64..45.0,
        carried in 0.0f64..3000.0,
    ) {
        let record = daily_record(t_max, t_min, None, None);
        let previous = previous_feature(carried, 0.0);

        let feature = compute_daily_feature(&DailyComputation {
            field_id: Uuid::new_v4(),
            daily: &record,
            hourly: &[],
            crop: None,
            previous: Some(&previous),
        });

        let gdd = feature.gdd.unwrap();
        let cumulative = feature.gdd_cumulative.unwrap();
        prop_assert!((cumulative - (carried + gdd)).abs() < 1e-3);
    }

    /// Water balance follows previous + rain − ETc (irrigation fixed at 0)
    #[test]
    fn water_balance_equation_holds(
        rain in 0.0f64..80.0,
        et0 in 0.0f64..15.0,
        carried in -200.0f64..200.0,
    ) {
        let record = daily_record(20.0, 10.0, Some(et0), Some(rain));
        let previous = previous_feature(0.0, carried);

        let feature = compute_daily_feature(&DailyComputation {
            field_id: Uuid::new_v4(),
            daily: &record,
            hourly: &[],
            crop: None,
            previous: Some(&previous),
        });

        let balance = feature.water_balance_mm.unwrap();
        let etc = feature.etc_mm.unwrap();
        prop_assert!((balance - (carried + rain - etc)).abs() < 1e-3);
    }

    /// Recommendations never repeat within one computed feature
    #[test]
    fn recommendations_are_deduplicated(
        t_max in -10.0f64..50.0,
        t_min in -10.0f64..50.0,
        rain in 0.0f64..30.0,
        et0 in 0.0f64..12.0,
        carried in 0.0f64..2000.0,
    ) {
        let record = daily_record(t_max, t_min, Some(et0), Some(rain));
        let previous = previous_feature(carried, -50.0);

        let feature = compute_daily_feature(&DailyComputation {
            field_id: Uuid::new_v4(),
            daily: &record,
            hourly: &[],
            crop: None,
            previous: Some(&previous),
        });

        let mut unique = feature.recommendations.clone();
        unique.sort();
        unique.dedup();
        prop_assert_eq!(unique.len(), feature.recommendations.len());
    }

    /// The same inputs always produce the same recommendations; re-running
    /// the calculator cannot duplicate a message
    #[test]
    fn recalculation_is_stable(
        rain in 0.0f64..5.0,
        et0 in 3.0f64..12.0,
    ) {
        let record = daily_record(30.0, 15.0, Some(et0), Some(rain));

        let compute = || {
            compute_daily_feature(&DailyComputation {
                field_id: Uuid::nil(),
                daily: &record,
                hourly: &[],
                crop: None,
                previous: None,
            })
        };

        let first = compute();
        let second = compute();
        prop_assert_eq!(&first.recommendations, &second.recommendations);

        let mut unique = first.recommendations.clone();
        unique.sort();
        unique.dedup();
        prop_assert_eq!(unique.len(), first.recommendations.len());
    }
}

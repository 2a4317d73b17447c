//! PostgreSQL weather store

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use shared::models::{
    AgroFeatureDaily, DailyWeatherRecord, Field, FieldCrop, FieldWithContext,
    HourlyWeatherRecord, PhenologyStage, Well,
};

use crate::error::AppResult;

use super::WeatherStore;

/// Postgres-backed store used by the scheduler binary
#[derive(Clone)]
pub struct PgWeatherStore {
    db: PgPool,
}

impl PgWeatherStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct FieldRow {
    id: Uuid,
    name: String,
    coordinates: Option<String>,
    area_decares: Option<f64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<FieldRow> for Field {
    fn from(row: FieldRow) -> Self {
        Field {
            id: row.id,
            name: row.name,
            coordinates: row.coordinates,
            area_decares: row.area_decares,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WellRow {
    id: Uuid,
    name: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

impl From<WellRow> for Well {
    fn from(row: WellRow) -> Self {
        Well {
            id: row.id,
            name: row.name,
            latitude: row.latitude,
            longitude: row.longitude,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CropRow {
    id: Uuid,
    name: String,
    planting_date: Option<NaiveDate>,
}

impl From<CropRow> for FieldCrop {
    fn from(row: CropRow) -> Self {
        FieldCrop {
            id: row.id,
            name: row.name,
            planting_date: row.planting_date,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct FeatureRow {
    field_id: Uuid,
    date: NaiveDate,
    crop_id: Option<Uuid>,
    gdd: Option<f64>,
    gdd_cumulative: Option<f64>,
    etc_mm: Option<f64>,
    etc_cumulative: Option<f64>,
    water_balance_mm: Option<f64>,
    rainfall_mm: Option<f64>,
    irrigation_mm: f64,
    vpd_max_kpa: Option<f64>,
    heat_stress_hours: i32,
    frost_hours: i32,
    phenology_stage: Option<String>,
    recommendations: Vec<String>,
    metadata: serde_json::Value,
}

impl From<FeatureRow> for AgroFeatureDaily {
    fn from(row: FeatureRow) -> Self {
        AgroFeatureDaily {
            field_id: row.field_id,
            date: row.date,
            crop_id: row.crop_id,
            gdd: row.gdd,
            gdd_cumulative: row.gdd_cumulative,
            etc_mm: row.etc_mm,
            etc_cumulative: row.etc_cumulative,
            water_balance_mm: row.water_balance_mm,
            rainfall_mm: row.rainfall_mm,
            irrigation_mm: row.irrigation_mm,
            vpd_max_kpa: row.vpd_max_kpa,
            heat_stress_hours: row.heat_stress_hours,
            frost_hours: row.frost_hours,
            phenology_stage: row.phenology_stage.as_deref().and_then(PhenologyStage::parse),
            recommendations: row.recommendations,
            metadata: row.metadata,
        }
    }
}

#[async_trait]
impl WeatherStore for PgWeatherStore {
    async fn candidate_fields(&self, ids: Option<&[Uuid]>) -> AppResult<Vec<FieldWithContext>> {
        let id_filter: Option<Vec<Uuid>> = ids.map(|ids| ids.to_vec());

        let fields = sqlx::query_as::<_, FieldRow>(
            r#"
            SELECT id, name, coordinates, area_decares, created_at, updated_at
            FROM fields
            WHERE ($1::uuid[] IS NULL OR id = ANY($1))
            ORDER BY created_at
            "#,
        )
        .bind(&id_filter)
        .fetch_all(&self.db)
        .await?;

        let mut candidates = Vec::with_capacity(fields.len());
        for field in fields {
            let wells = sqlx::query_as::<_, WellRow>(
                r#"
                SELECT w.id, w.name, w.latitude, w.longitude
                FROM wells w
                JOIN field_wells fw ON fw.well_id = w.id
                WHERE fw.field_id = $1
                ORDER BY fw.created_at
                "#,
            )
            .bind(field.id)
            .fetch_all(&self.db)
            .await?;

            let active_crop = sqlx::query_as::<_, CropRow>(
                r#"
                SELECT id, name, planting_date
                FROM field_crops
                WHERE field_id = $1 AND status = 'growing'
                ORDER BY planting_date DESC NULLS LAST, created_at DESC
                LIMIT 1
                "#,
            )
            .bind(field.id)
            .fetch_optional(&self.db)
            .await?;

            candidates.push(FieldWithContext {
                field: field.into(),
                wells: wells.into_iter().map(Well::from).collect(),
                active_crop: active_crop.map(FieldCrop::from),
            });
        }

        Ok(candidates)
    }

    async fn upsert_hourly(
        &self,
        field_id: Uuid,
        source: &str,
        record: &HourlyWeatherRecord,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO weather_hourly (
                field_id, source, recorded_at,
                temperature_celsius, relative_humidity_percent, precipitation_mm,
                wind_speed_kmh, wind_direction_deg, wind_gusts_kmh,
                shortwave_radiation_wm2, et0_mm, vapour_pressure_deficit_kpa,
                soil_temperature_celsius, soil_moisture
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (field_id, recorded_at, source) DO UPDATE SET
                temperature_celsius = EXCLUDED.temperature_celsius,
                relative_humidity_percent = EXCLUDED.relative_humidity_percent,
                precipitation_mm = EXCLUDED.precipitation_mm,
                wind_speed_kmh = EXCLUDED.wind_speed_kmh,
                wind_direction_deg = EXCLUDED.wind_direction_deg,
                wind_gusts_kmh = EXCLUDED.wind_gusts_kmh,
                shortwave_radiation_wm2 = EXCLUDED.shortwave_radiation_wm2,
                et0_mm = EXCLUDED.et0_mm,
                vapour_pressure_deficit_kpa = EXCLUDED.vapour_pressure_deficit_kpa,
                soil_temperature_celsius = EXCLUDED.soil_temperature_celsius,
                soil_moisture = EXCLUDED.soil_moisture
            "#,
        )
        .bind(field_id)
        .bind(source)
        .bind(record.timestamp)
        .bind(record.temperature_celsius)
        .bind(record.relative_humidity_percent)
        .bind(record.precipitation_mm)
        .bind(record.wind_speed_kmh)
        .bind(record.wind_direction_deg)
        .bind(record.wind_gusts_kmh)
        .bind(record.shortwave_radiation_wm2)
        .bind(record.et0_mm)
        .bind(record.vapour_pressure_deficit_kpa)
        .bind(record.soil_temperature_celsius)
        .bind(record.soil_moisture)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn upsert_daily(
        &self,
        field_id: Uuid,
        source: &str,
        record: &DailyWeatherRecord,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO weather_daily (
                field_id, source, date,
                temp_max_celsius, temp_min_celsius, precipitation_sum_mm,
                shortwave_radiation_sum_mj, et0_mm, vpd_max_kpa,
                rainfall_probability_percent, daylight_seconds
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (field_id, date, source) DO UPDATE SET
                temp_max_celsius = EXCLUDED.temp_max_celsius,
                temp_min_celsius = EXCLUDED.temp_min_celsius,
                precipitation_sum_mm = EXCLUDED.precipitation_sum_mm,
                shortwave_radiation_sum_mj = EXCLUDED.shortwave_radiation_sum_mj,
                et0_mm = EXCLUDED.et0_mm,
                vpd_max_kpa = EXCLUDED.vpd_max_kpa,
                rainfall_probability_percent = EXCLUDED.rainfall_probability_percent,
                daylight_seconds = EXCLUDED.daylight_seconds
            "#,
        )
        .bind(field_id)
        .bind(source)
        .bind(record.date)
        .bind(record.temp_max_celsius)
        .bind(record.temp_min_celsius)
        .bind(record.precipitation_sum_mm)
        .bind(record.shortwave_radiation_sum_mj)
        .bind(record.et0_mm)
        .bind(record.vpd_max_kpa)
        .bind(record.rainfall_probability_percent)
        .bind(record.daylight_seconds)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn upsert_feature(&self, feature: &AgroFeatureDaily) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO agro_features_daily (
                field_id, date, crop_id,
                gdd, gdd_cumulative, etc_mm, etc_cumulative,
                water_balance_mm, rainfall_mm, irrigation_mm, vpd_max_kpa,
                heat_stress_hours, frost_hours, phenology_stage,
                recommendations, metadata
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            ON CONFLICT (field_id, date) DO UPDATE SET
                crop_id = EXCLUDED.crop_id,
                gdd = EXCLUDED.gdd,
                gdd_cumulative = EXCLUDED.gdd_cumulative,
                etc_mm = EXCLUDED.etc_mm,
                etc_cumulative = EXCLUDED.etc_cumulative,
                water_balance_mm = EXCLUDED.water_balance_mm,
                rainfall_mm = EXCLUDED.rainfall_mm,
                irrigation_mm = EXCLUDED.irrigation_mm,
                vpd_max_kpa = EXCLUDED.vpd_max_kpa,
                heat_stress_hours = EXCLUDED.heat_stress_hours,
                frost_hours = EXCLUDED.frost_hours,
                phenology_stage = EXCLUDED.phenology_stage,
                recommendations = EXCLUDED.recommendations,
                metadata = EXCLUDED.metadata
            "#,
        )
        .bind(feature.field_id)
        .bind(feature.date)
        .bind(feature.crop_id)
        .bind(feature.gdd)
        .bind(feature.gdd_cumulative)
        .bind(feature.etc_mm)
        .bind(feature.etc_cumulative)
        .bind(feature.water_balance_mm)
        .bind(feature.rainfall_mm)
        .bind(feature.irrigation_mm)
        .bind(feature.vpd_max_kpa)
        .bind(feature.heat_stress_hours)
        .bind(feature.frost_hours)
        .bind(feature.phenology_stage.map(|s| s.as_str()))
        .bind(&feature.recommendations)
        .bind(&feature.metadata)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn latest_feature_before(
        &self,
        field_id: Uuid,
        date: NaiveDate,
    ) -> AppResult<Option<AgroFeatureDaily>> {
        let row = sqlx::query_as::<_, FeatureRow>(
            r#"
            SELECT field_id, date, crop_id,
                   gdd, gdd_cumulative, etc_mm, etc_cumulative,
                   water_balance_mm, rainfall_mm, irrigation_mm, vpd_max_kpa,
                   heat_stress_hours, frost_hours, phenology_stage,
                   recommendations, metadata
            FROM agro_features_daily
            WHERE field_id = $1 AND date < $2
            ORDER BY date DESC
            LIMIT 1
            "#,
        )
        .bind(field_id)
        .bind(date)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(AgroFeatureDaily::from))
    }
}

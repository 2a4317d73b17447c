//! In-memory weather store for tests and demos

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use shared::models::{
    AgroFeatureDaily, DailyWeatherRecord, FieldWithContext, HourlyWeatherRecord,
};

use crate::error::AppResult;

use super::WeatherStore;

/// Keyed maps mirroring the upsert contract; rows are value copies
#[derive(Default)]
pub struct MemoryWeatherStore {
    fields: Mutex<Vec<FieldWithContext>>,
    hourly: Mutex<HashMap<(Uuid, DateTime<Utc>, String), HourlyWeatherRecord>>,
    daily: Mutex<HashMap<(Uuid, NaiveDate, String), DailyWeatherRecord>>,
    features: Mutex<HashMap<(Uuid, NaiveDate), AgroFeatureDaily>>,
}

impl MemoryWeatherStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a candidate field
    pub fn push_field(&self, candidate: FieldWithContext) {
        self.fields.lock().push(candidate);
    }

    /// Seed a pre-existing feature row (the carry-forward basis)
    pub fn push_feature(&self, feature: AgroFeatureDaily) {
        self.features
            .lock()
            .insert((feature.field_id, feature.date), feature);
    }

    pub fn hourly_row_count(&self) -> usize {
        self.hourly.lock().len()
    }

    pub fn daily_row_count(&self) -> usize {
        self.daily.lock().len()
    }

    pub fn feature_row_count(&self) -> usize {
        self.features.lock().len()
    }

    pub fn feature(&self, field_id: Uuid, date: NaiveDate) -> Option<AgroFeatureDaily> {
        self.features.lock().get(&(field_id, date)).cloned()
    }
}

#[async_trait]
impl WeatherStore for MemoryWeatherStore {
    async fn candidate_fields(&self, ids: Option<&[Uuid]>) -> AppResult<Vec<FieldWithContext>> {
        let fields = self.fields.lock();
        Ok(fields
            .iter()
            .filter(|c| ids.map_or(true, |ids| ids.contains(&c.field.id)))
            .cloned()
            .collect())
    }

    async fn upsert_hourly(
        &self,
        field_id: Uuid,
        source: &str,
        record: &HourlyWeatherRecord,
    ) -> AppResult<()> {
        self.hourly
            .lock()
            .insert((field_id, record.timestamp, source.to_string()), record.clone());
        Ok(())
    }

    async fn upsert_daily(
        &self,
        field_id: Uuid,
        source: &str,
        record: &DailyWeatherRecord,
    ) -> AppResult<()> {
        self.daily
            .lock()
            .insert((field_id, record.date, source.to_string()), record.clone());
        Ok(())
    }

    async fn upsert_feature(&self, feature: &AgroFeatureDaily) -> AppResult<()> {
        self.features
            .lock()
            .insert((feature.field_id, feature.date), feature.clone());
        Ok(())
    }

    async fn latest_feature_before(
        &self,
        field_id: Uuid,
        date: NaiveDate,
    ) -> AppResult<Option<AgroFeatureDaily>> {
        let features = self.features.lock();
        Ok(features
            .values()
            .filter(|f| f.field_id == field_id && f.date < date)
            .max_by_key(|f| f.date)
            .cloned())
    }
}

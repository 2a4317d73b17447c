//! Persistence collaborator contract
//!
//! The engine owns no schema; it talks to storage through [`WeatherStore`].
//! Upserts are idempotent on their keys, so overlapping sync runs converge
//! on the same rows. Cumulative-feature reads are not transactional with
//! the writes: concurrent runs for the same field must be serialized by
//! the scheduler.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use shared::models::{
    AgroFeatureDaily, DailyWeatherRecord, FieldWithContext, HourlyWeatherRecord,
};

use crate::error::AppResult;

pub mod memory;
pub mod postgres;

pub use memory::MemoryWeatherStore;
pub use postgres::PgWeatherStore;

/// Data source tag persisted with every observation
pub const SOURCE_OPEN_METEO: &str = "open-meteo";

/// Storage operations the engine depends on
#[async_trait]
pub trait WeatherStore: Send + Sync {
    /// Candidate fields with their wells (stable insertion order) and the
    /// single most recent actively-growing crop; optionally filtered by
    /// explicit field ids
    async fn candidate_fields(&self, ids: Option<&[Uuid]>) -> AppResult<Vec<FieldWithContext>>;

    /// Idempotent upsert keyed by `(field_id, timestamp, source)`
    async fn upsert_hourly(
        &self,
        field_id: Uuid,
        source: &str,
        record: &HourlyWeatherRecord,
    ) -> AppResult<()>;

    /// Idempotent upsert keyed by `(field_id, date, source)`
    async fn upsert_daily(
        &self,
        field_id: Uuid,
        source: &str,
        record: &DailyWeatherRecord,
    ) -> AppResult<()>;

    /// Idempotent upsert keyed by `(field_id, date)`
    async fn upsert_feature(&self, feature: &AgroFeatureDaily) -> AppResult<()>;

    /// Most recent feature strictly before `date` for the field, the
    /// carry-forward basis for a sync batch
    async fn latest_feature_before(
        &self,
        field_id: Uuid,
        date: NaiveDate,
    ) -> AppResult<Option<AgroFeatureDaily>>;
}

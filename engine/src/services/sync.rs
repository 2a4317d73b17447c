//! Weather sync orchestration
//!
//! Loads candidate fields, resolves a coordinate for each, batches the
//! provider fetch in chunks, persists observations idempotently and folds
//! the daily agro features forward. Chunks run with bounded concurrency;
//! fields never span chunks, so each field's writes stay ordered. One
//! field's failure never aborts its siblings, and one chunk's provider
//! failure never aborts the other chunks.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use uuid::Uuid;

use shared::models::{FieldCoordinate, FieldWithContext, HourlyWeatherRecord};

use crate::error::{AppError, AppResult};
use crate::external::open_meteo::{FetchOptions, LocationWeather, WeatherProvider};
use crate::services::cache::{CacheNamespace, WeatherCache};
use crate::services::coordinates::CoordinateResolver;
use crate::services::metrics::{compute_daily_feature, DailyComputation};
use crate::store::{WeatherStore, SOURCE_OPEN_METEO};

/// Outcome of one sync run
///
/// Upsert counters count every call, not only creates; `messages` is the
/// flat human-readable log and `issues` its structured counterpart.
#[derive(Debug, Default, Serialize)]
pub struct WeatherSyncReport {
    pub total_fields: usize,
    pub processed_fields: usize,
    pub skipped_fields: usize,
    pub hourly_upserts: usize,
    pub daily_upserts: usize,
    pub feature_upserts: usize,
    pub messages: Vec<String>,
    pub issues: Vec<SyncIssue>,
}

/// One recorded problem from a sync run
#[derive(Debug, Clone, Serialize)]
pub struct SyncIssue {
    pub field_id: Option<Uuid>,
    pub field_name: Option<String>,
    pub kind: SyncIssueKind,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SyncIssueKind {
    CoordinateUnresolved,
    ProviderError,
    PersistenceError,
}

/// Sync orchestrator
#[derive(Clone)]
pub struct WeatherSyncService {
    store: Arc<dyn WeatherStore>,
    provider: Arc<dyn WeatherProvider>,
    cache: Arc<WeatherCache>,
    resolver: CoordinateResolver,
    options: FetchOptions,
    chunk_size: usize,
    max_concurrent_chunks: usize,
}

/// One field ready for fetching
struct SyncTarget<'a> {
    coordinate: FieldCoordinate,
    source_label: String,
    candidate: &'a FieldWithContext,
}

#[derive(Debug, Default, Clone, Copy)]
struct FieldCounts {
    hourly: usize,
    daily: usize,
    features: usize,
}

struct FieldOutcome {
    field_id: Uuid,
    field_name: String,
    source_label: String,
    result: Result<FieldCounts, AppError>,
}

enum ChunkOutcome {
    Fetched(Vec<FieldOutcome>),
    FetchFailed {
        field_names: Vec<String>,
        error: AppError,
    },
}

impl WeatherSyncService {
    pub fn new(
        store: Arc<dyn WeatherStore>,
        provider: Arc<dyn WeatherProvider>,
        cache: Arc<WeatherCache>,
        resolver: CoordinateResolver,
    ) -> Self {
        Self {
            store,
            provider,
            cache,
            resolver,
            options: FetchOptions::default(),
            chunk_size: 8,
            max_concurrent_chunks: 4,
        }
    }

    /// Override chunk size and the number of chunks in flight
    pub fn with_chunking(mut self, chunk_size: usize, max_concurrent_chunks: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self.max_concurrent_chunks = max_concurrent_chunks.max(1);
        self
    }

    /// Override provider request options
    pub fn with_fetch_options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }

    /// Run one sync over all candidate fields, or only the given ids
    pub async fn sync_fields(&self, field_ids: Option<&[Uuid]>) -> AppResult<WeatherSyncReport> {
        let candidates = self.store.candidate_fields(field_ids).await?;

        let mut report = WeatherSyncReport {
            total_fields: candidates.len(),
            ..Default::default()
        };

        let mut targets: Vec<SyncTarget<'_>> = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            match self.resolver.resolve(candidate) {
                Some(resolved) => {
                    let source_label = resolved.source.label().to_string();
                    tracing::debug!(
                        field = %candidate.field.name,
                        source = %source_label,
                        "resolved coordinate"
                    );
                    targets.push(SyncTarget {
                        coordinate: FieldCoordinate {
                            field_id: candidate.field.id,
                            field_name: candidate.field.name.clone(),
                            latitude: resolved.coordinates.latitude,
                            longitude: resolved.coordinates.longitude,
                        },
                        source_label,
                        candidate,
                    });
                }
                None => {
                    report.skipped_fields += 1;
                    report
                        .messages
                        .push(format!("SKIP {}: no resolvable coordinate", candidate.field.name));
                    report.issues.push(SyncIssue {
                        field_id: Some(candidate.field.id),
                        field_name: Some(candidate.field.name.clone()),
                        kind: SyncIssueKind::CoordinateUnresolved,
                        detail: "no resolvable coordinate".to_string(),
                    });
                }
            }
        }

        let outcomes: Vec<ChunkOutcome> =
            stream::iter(targets.chunks(self.chunk_size).map(|chunk| self.process_chunk(chunk)))
                .buffer_unordered(self.max_concurrent_chunks)
                .collect()
                .await;

        for outcome in outcomes {
            match outcome {
                ChunkOutcome::Fetched(fields) => {
                    for field in fields {
                        match field.result {
                            Ok(counts) => {
                                report.processed_fields += 1;
                                report.hourly_upserts += counts.hourly;
                                report.daily_upserts += counts.daily;
                                report.feature_upserts += counts.features;
                                report.messages.push(format!(
                                    "OK {} ({}): {} hourly, {} daily, {} features",
                                    field.field_name,
                                    field.source_label,
                                    counts.hourly,
                                    counts.daily,
                                    counts.features
                                ));
                            }
                            Err(error) => {
                                report
                                    .messages
                                    .push(format!("ERR {}: {}", field.field_name, error));
                                report.issues.push(SyncIssue {
                                    field_id: Some(field.field_id),
                                    field_name: Some(field.field_name),
                                    kind: SyncIssueKind::PersistenceError,
                                    detail: error.to_string(),
                                });
                            }
                        }
                    }
                }
                ChunkOutcome::FetchFailed { field_names, error } => {
                    let names = field_names.join(", ");
                    report
                        .messages
                        .push(format!("ERR chunk [{names}]: {error}"));
                    report.issues.push(SyncIssue {
                        field_id: None,
                        field_name: None,
                        kind: SyncIssueKind::ProviderError,
                        detail: format!("{error} (fields: {names})"),
                    });
                }
            }
        }

        tracing::info!(
            total = report.total_fields,
            processed = report.processed_fields,
            skipped = report.skipped_fields,
            hourly = report.hourly_upserts,
            daily = report.daily_upserts,
            features = report.feature_upserts,
            "weather sync run finished"
        );

        Ok(report)
    }

    /// Fetch one chunk and persist its locations sequentially, isolating
    /// each field's failure
    async fn process_chunk(&self, chunk: &[SyncTarget<'_>]) -> ChunkOutcome {
        let coordinates: Vec<FieldCoordinate> =
            chunk.iter().map(|t| t.coordinate.clone()).collect();

        let locations = match self.provider.fetch_batch(&coordinates, &self.options).await {
            Ok(locations) => locations,
            Err(error) => {
                return ChunkOutcome::FetchFailed {
                    field_names: chunk
                        .iter()
                        .map(|t| t.coordinate.field_name.clone())
                        .collect(),
                    error,
                };
            }
        };

        // The client guarantees response length; zip by position
        let mut outcomes = Vec::with_capacity(chunk.len());
        for (target, location) in chunk.iter().zip(locations) {
            let result = self.persist_location(target, &location).await;
            outcomes.push(FieldOutcome {
                field_id: target.coordinate.field_id,
                field_name: target.coordinate.field_name.clone(),
                source_label: target.source_label.clone(),
                result,
            });
        }

        ChunkOutcome::Fetched(outcomes)
    }

    async fn persist_location(
        &self,
        target: &SyncTarget<'_>,
        location: &LocationWeather,
    ) -> Result<FieldCounts, AppError> {
        let field_id = target.coordinate.field_id;
        let mut counts = FieldCounts::default();

        for record in &location.hourly {
            self.store
                .upsert_hourly(field_id, SOURCE_OPEN_METEO, record)
                .await?;
            counts.hourly += 1;
        }

        let mut daily = location.daily.clone();
        daily.sort_by_key(|d| d.date);

        for record in &daily {
            self.store
                .upsert_daily(field_id, SOURCE_OPEN_METEO, record)
                .await?;
            counts.daily += 1;
        }

        if let Some(first) = daily.first() {
            // Storage is consulted once per field per run; after that the
            // previous feature is threaded through the fold in memory
            let mut previous = self
                .store
                .latest_feature_before(field_id, first.date)
                .await?;

            let hourly_by_day =
                group_by_local_day(&location.hourly, location.utc_offset_seconds);

            for record in &daily {
                let hourly_for_day = hourly_by_day
                    .get(&record.date)
                    .map(Vec::as_slice)
                    .unwrap_or(&[]);

                let feature = compute_daily_feature(&DailyComputation {
                    field_id,
                    daily: record,
                    hourly: hourly_for_day,
                    crop: target.candidate.active_crop.as_ref(),
                    previous: previous.as_ref(),
                });

                self.store.upsert_feature(&feature).await?;
                counts.features += 1;
                previous = Some(feature);
            }
        }

        // Synced observations supersede whatever was served before
        self.cache
            .delete(CacheNamespace::FieldWeather, &field_id.to_string());

        Ok(counts)
    }
}

/// Group hourly records by the location's local calendar day
fn group_by_local_day(
    hourly: &[HourlyWeatherRecord],
    utc_offset_seconds: i32,
) -> HashMap<NaiveDate, Vec<HourlyWeatherRecord>> {
    let offset = Duration::seconds(i64::from(utc_offset_seconds));
    let mut by_day: HashMap<NaiveDate, Vec<HourlyWeatherRecord>> = HashMap::new();
    for record in hourly {
        let local_day = (record.timestamp + offset).date_naive();
        by_day.entry(local_day).or_default().push(record.clone());
    }
    by_day
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn hourly_records_grouped_by_local_day() {
        // 22:30 UTC at UTC+3 is 01:30 the next local day
        let late = HourlyWeatherRecord::at(Utc.with_ymd_and_hms(2024, 5, 13, 22, 30, 0).unwrap());
        let noon = HourlyWeatherRecord::at(Utc.with_ymd_and_hms(2024, 5, 13, 12, 0, 0).unwrap());

        let grouped = group_by_local_day(&[late, noon], 3 * 3600);
        let may_13 = NaiveDate::from_ymd_opt(2024, 5, 13).unwrap();
        let may_14 = NaiveDate::from_ymd_opt(2024, 5, 14).unwrap();

        assert_eq!(grouped.get(&may_13).map(Vec::len), Some(1));
        assert_eq!(grouped.get(&may_14).map(Vec::len), Some(1));
    }
}

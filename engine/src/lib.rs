//! Weather ingestion and agronomic-metrics engine for the farm-management
//! platform
//!
//! The engine resolves a coordinate for every field through a fallback
//! chain, batch-fetches forecast and recent-history weather from
//! Open-Meteo, persists hourly and daily observations idempotently,
//! derives cumulative agronomic indicators (GDD, ETc, water balance,
//! stress hours) carried forward day-over-day, and serves hot data through
//! a namespaced TTL cache. It is driven by an external scheduler via the
//! `farm-weather-sync` binary.

pub mod config;
pub mod error;
pub mod external;
pub mod services;
pub mod store;

pub use config::Config;
pub use error::{AppError, AppResult};

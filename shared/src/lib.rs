//! Shared types and models for the farm-management platform's weather and
//! agronomics engine
//!
//! This crate contains the data model (fields, wells, crops, weather
//! observations, derived agro features) and the pure geometry/numeric
//! helpers used at the provider boundary.

pub mod geo;
pub mod models;
pub mod numeric;
pub mod types;

pub use models::*;
pub use types::*;

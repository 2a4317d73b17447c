//! Engine services

pub mod cache;
pub mod coordinates;
pub mod crops;
pub mod metrics;
pub mod sync;
pub mod wells;

pub use cache::WeatherCache;
pub use coordinates::CoordinateResolver;
pub use sync::WeatherSyncService;

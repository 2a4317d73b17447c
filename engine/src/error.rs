//! Error handling for the weather engine

use thiserror::Error;

/// Engine error types
///
/// Unresolved field coordinates are deliberately not represented here:
/// those fields are skipped and counted by the sync report, never raised.
/// Malformed provider numbers are normalized to absent readings at the
/// client boundary and never surface as errors either.
#[derive(Error, Debug)]
pub enum AppError {
    /// Provider returned a different number of locations than requested;
    /// the whole chunk is discarded
    #[error("weather provider returned {actual} locations for {expected} coordinates")]
    ProviderShape { expected: usize, actual: usize },

    /// Transport failure, non-2xx response or unparsable body
    #[error("weather provider error: {0}")]
    Provider(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Result type alias for engine operations
pub type AppResult<T> = Result<T, AppError>;

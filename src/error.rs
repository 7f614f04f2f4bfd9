// Error types for the engine, the snapshot store, and the service that joins them.

use thiserror::Error;

/// Errors raised by a single engine operation. None of them are retried internally.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// No match carries the requested id.
    #[error("match not found: {0}")]
    NotFound(String),
    /// Missing or malformed score/card fields, or a result the bracket cannot accept.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl EngineError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        EngineError::InvalidInput(msg.into())
    }

    /// Short label used for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            EngineError::NotFound(_) => "not_found",
            EngineError::InvalidInput(_) => "invalid_input",
        }
    }
}

/// Errors from the snapshot store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Sql(#[from] sqlx::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Another writer saved a newer snapshot since this one was read.
    #[error("snapshot version conflict: expected {expected}")]
    VersionConflict { expected: i64 },
    #[error("no tournament snapshot has been created")]
    Missing,
}

/// Errors surfaced by the tournament service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

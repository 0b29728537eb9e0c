//! Error types for the detection engine.

use thiserror::Error;

/// Main error type for detection operations.
#[derive(Error, Debug)]
pub enum DetectError {
    /// Batch validation failure (bad columns, duplicate ids, bad values).
    /// The detail string lists up to five offending rows or ids.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Detection requested before any transactions were ingested.
    #[error("No transactions ingested; upload a batch before requesting detection")]
    NoTransactions,

    /// Unknown detection strategy requested by the caller.
    #[error("Invalid strategy '{0}'. Must be one of: all_patterns, cycles_only, fan_patterns, shells_only")]
    UnknownStrategy(String),

    /// IO error while reading a batch.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed CSV input.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Serialization error while emitting a response.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DetectError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

/// Result type alias for detection operations.
pub type DetectResult<T> = Result<T, DetectError>;

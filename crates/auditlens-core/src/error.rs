use thiserror::Error;

/// Failures surfaced by the ingest entry points.
///
/// `Validation` is always raised before any storage access, so a rejected
/// call never leaves a partial row behind.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl IngestError {
    pub fn missing(field: &str) -> Self {
        Self::Validation(format!("{field} is required"))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("invalid {field} (expected YYYY-MM-DD)")]
    InvalidDate { field: &'static str },

    #[error("endDate must be on or after startDate")]
    Reversed,
}

use thiserror::Error;

/// Caller misuse detected at the boundary of [`crate::aggregate`].
///
/// Per-row data defects are not errors; they surface as
/// [`crate::SkipReason`] values on the resulting series.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregateError {
    #[error("invalid input: bucketing requires field `{field}`, which no row provides")]
    InvalidInput { field: &'static str },

    #[error("invalid year filter {0:?}, expected \"all\" or a year like 2024")]
    InvalidYearFilter(String),
}

pub type Result<T> = std::result::Result<T, AggregateError>;

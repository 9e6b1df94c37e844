use polars::prelude::{DataFrame, PolarsError};
use thiserror::Error;

use crate::fetch::FetchResult;

/// Transformer errors
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("unexpected {found} payload for {date}, expected {expected}")]
    UnexpectedPayload {
        date: chrono::NaiveDate,
        expected: &'static str,
        found: &'static str,
    },
    #[error("malformed payload for {date}: {message}")]
    Malformed { date: chrono::NaiveDate, message: String },
    #[error("invalid column '{column}': {message}")]
    InvalidColumn { column: String, message: String },
    #[error(transparent)]
    Polars(#[from] PolarsError),
}

/// Reshapes a job's raw payloads into one normalized frame.
///
/// Implementations are synchronous and must depend only on the payloads
/// and their order, which is the order of the job's date range.
pub trait Transformer: Send + Sync {
    fn transform(&self, payloads: &[FetchResult]) -> Result<DataFrame, TransformError>;
}

impl<F> Transformer for F
where
    F: Fn(&[FetchResult]) -> Result<DataFrame, TransformError> + Send + Sync,
{
    fn transform(&self, payloads: &[FetchResult]) -> Result<DataFrame, TransformError> {
        self(payloads)
    }
}

//! Evaluator error types.

use obfusq_hal::HalError;
use thiserror::Error;

/// Result type for evaluator operations.
pub type EvalResult<T> = Result<T, EvalError>;

/// Errors that can occur during validation.
#[derive(Debug, Error)]
pub enum EvalError {
    /// The backend refused or failed a run.
    #[error("Backend error: {0}")]
    Backend(#[from] HalError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),

    /// Serialization error.
    #[error("Export error: {0}")]
    Export(String),
}

impl From<serde_json::Error> for EvalError {
    fn from(e: serde_json::Error) -> Self {
        EvalError::Export(e.to_string())
    }
}

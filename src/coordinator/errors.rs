//! # Execution Errors

use thiserror::Error;

use crate::catalog::LoadError;
use crate::executor::EvalError;

/// Result type for query execution
pub type ExecutionResult<T> = Result<T, ExecutionError>;

/// Execution errors.
///
/// `Clone` because every request joined to one in-flight execution receives
/// the same outcome.
#[derive(Debug, Clone, Error)]
pub enum ExecutionError {
    #[error("Failed to load card data: {0}")]
    Load(#[from] LoadError),

    #[error("{source}")]
    Evaluation { record: String, source: EvalError },

    #[error("Card data unavailable: {0}")]
    Unavailable(EvalError),
}

impl ExecutionError {
    /// Whether the failure came from loading rather than evaluating
    pub fn is_load_error(&self) -> bool {
        matches!(self, ExecutionError::Load(_))
    }
}

impl From<EvalError> for ExecutionError {
    fn from(source: EvalError) -> Self {
        match source.record() {
            Some(record) => ExecutionError::Evaluation {
                record: record.to_string(),
                source,
            },
            None => ExecutionError::Unavailable(source),
        }
    }
}

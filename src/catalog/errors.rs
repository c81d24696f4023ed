//! # Catalog Load Errors

use thiserror::Error;

use crate::index::IndexError;
use crate::query::Prop;

/// Result type for catalog loading
pub type LoadResult<T> = Result<T, LoadError>;

/// Catalog load errors.
///
/// `Clone` because one in-flight load is awaited by every caller that asked
/// for the same file.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    #[error("Failed to read {name}: {message}")]
    Io { name: String, message: String },

    #[error("Failed to decode {name}: {message}")]
    Decode { name: String, message: String },

    #[error("Invalid sort index {name}: {source}")]
    Index { name: String, source: IndexError },

    #[error("Property {0} has no payload of its own")]
    NotStored(Prop),

    #[error("Dataset is out of date: snapshot {expected}, received {actual}")]
    Stale { expected: u64, actual: u64 },

    #[error("Load of {0} was aborted")]
    Aborted(String),
}

impl LoadError {
    /// Errors that may go away when the pipeline is run again
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LoadError::Io { .. } | LoadError::Stale { .. } | LoadError::Aborted(_)
        )
    }
}

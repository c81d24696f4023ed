//! Evaluation error types
//!
//! Error codes:
//! - CQ_EVAL_TYPE_MISMATCH (ERROR)
//! - CQ_EVAL_LENGTH_UNKNOWN (ERROR)
//! - CQ_EVAL_SET_FAILURE (ERROR)
//!
//! Evaluation errors are data-integrity or programming errors: a condition
//! that can't apply to the values it reads. They are never expected for
//! queries produced by the parser against a well-formed catalog.

use std::fmt;

use crate::uint_set::UintSetError;

/// Evaluation error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalErrorCode {
    /// Condition and property value have incompatible types
    TypeMismatch,
    /// No property loaded, so the number of records is unknown
    LengthUnknown,
    /// Version set operation failed, usually an exhausted arena
    SetFailure,
}

impl EvalErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            EvalErrorCode::TypeMismatch => "CQ_EVAL_TYPE_MISMATCH",
            EvalErrorCode::LengthUnknown => "CQ_EVAL_LENGTH_UNKNOWN",
            EvalErrorCode::SetFailure => "CQ_EVAL_SET_FAILURE",
        }
    }
}

impl fmt::Display for EvalErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Evaluation error, optionally tied to the record being evaluated
#[derive(Debug, Clone, PartialEq)]
pub struct EvalError {
    code: EvalErrorCode,
    message: String,
    record: Option<String>,
}

impl EvalError {
    /// Condition can't be applied to the value found
    pub fn type_mismatch(condition: &str, value: impl fmt::Debug) -> Self {
        Self {
            code: EvalErrorCode::TypeMismatch,
            message: format!("Condition {} can't be applied to {:?}.", condition, value),
            record: None,
        }
    }

    pub fn length_unknown() -> Self {
        Self {
            code: EvalErrorCode::LengthUnknown,
            message: "Catalog length unknown, no property loaded.".to_string(),
            record: None,
        }
    }

    /// Attach the name (or index) of the record being evaluated
    pub fn in_record(mut self, record: impl Into<String>) -> Self {
        self.record = Some(record.into());
        self
    }

    /// Returns the error code
    pub fn code(&self) -> EvalErrorCode {
        self.code
    }

    /// Returns the message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Record the error occurred in, if known
    pub fn record(&self) -> Option<&str> {
        self.record.as_deref()
    }
}

impl From<UintSetError> for EvalError {
    fn from(err: UintSetError) -> Self {
        Self {
            code: EvalErrorCode::SetFailure,
            message: err.to_string(),
            record: None,
        }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ERROR] {}: ", self.code.code())?;

        if let Some(record) = &self.record {
            write!(f, "Couldn't evaluate query with \"{}\": ", record)?;
        }
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for EvalError {}

/// Result type for evaluation
pub type EvalResult<T> = Result<T, EvalError>;

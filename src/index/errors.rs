//! Sort-index error types
//!
//! Error codes:
//! - CQ_INDEX_TRUNCATED (ERROR)
//! - CQ_INDEX_BAD_MAGIC (ERROR)
//! - CQ_INDEX_UNSUPPORTED_VERSION (ERROR)
//! - CQ_INDEX_BAD_KIND (ERROR)
//! - CQ_INDEX_CORRUPT (ERROR)
//! - CQ_INDEX_ORDER_MISMATCH (ERROR)

use std::fmt;

/// Sort-index error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexErrorCode {
    /// A header field or table extends past the end of the buffer
    Truncated,
    /// First four bytes are not `MTGI`
    BadMagic,
    /// Format version other than the supported one
    UnsupportedVersion,
    /// Index kind other than per-record or per-version
    BadKind,
    /// Group table not monotonic, or sort key not UTF-8
    Corrupt,
    /// Index was built for a different sort order than requested
    OrderMismatch,
}

impl IndexErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            IndexErrorCode::Truncated => "CQ_INDEX_TRUNCATED",
            IndexErrorCode::BadMagic => "CQ_INDEX_BAD_MAGIC",
            IndexErrorCode::UnsupportedVersion => "CQ_INDEX_UNSUPPORTED_VERSION",
            IndexErrorCode::BadKind => "CQ_INDEX_BAD_KIND",
            IndexErrorCode::Corrupt => "CQ_INDEX_CORRUPT",
            IndexErrorCode::OrderMismatch => "CQ_INDEX_ORDER_MISMATCH",
        }
    }
}

impl fmt::Display for IndexErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Sort-index error with byte offset context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexError {
    code: IndexErrorCode,
    message: String,
    offset: Option<usize>,
}

impl IndexError {
    /// Buffer too short for the structure at `offset`
    pub fn truncated(offset: usize, needed: usize, len: usize) -> Self {
        Self {
            code: IndexErrorCode::Truncated,
            message: format!(
                "Need {} bytes at offset {}, buffer has {}.",
                needed, offset, len
            ),
            offset: Some(offset),
        }
    }

    pub fn bad_magic(found: &[u8]) -> Self {
        Self {
            code: IndexErrorCode::BadMagic,
            message: format!("Expected magic \"MTGI\", found {:?}.", found),
            offset: Some(0),
        }
    }

    pub fn unsupported_version(version: u16, supported: u16) -> Self {
        Self {
            code: IndexErrorCode::UnsupportedVersion,
            message: format!(
                "Format version {} not supported, expected {}.",
                version, supported
            ),
            offset: Some(4),
        }
    }

    pub fn bad_kind(kind: u8) -> Self {
        Self {
            code: IndexErrorCode::BadKind,
            message: format!("Unknown index kind {}.", kind),
            offset: Some(6),
        }
    }

    /// Structural inconsistency at `offset`
    pub fn corrupt(offset: usize, reason: impl Into<String>) -> Self {
        Self {
            code: IndexErrorCode::Corrupt,
            message: format!("Corrupt index at offset {}: {}", offset, reason.into()),
            offset: Some(offset),
        }
    }

    pub fn order_mismatch(requested: &str, found: &str) -> Self {
        Self {
            code: IndexErrorCode::OrderMismatch,
            message: format!(
                "Requested sort order {}, index is for {}.",
                requested, found
            ),
            offset: Some(16),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> IndexErrorCode {
        self.code
    }

    /// Returns the message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the offset if applicable
    pub fn offset(&self) -> Option<usize> {
        self.offset
    }
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ERROR] {}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for IndexError {}

/// Result type for sort-index operations
pub type IndexResult<T> = Result<T, IndexError>;

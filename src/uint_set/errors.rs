//! Integer-set error types
//!
//! Error codes:
//! - CQ_SET_OUT_OF_BOUNDS (ERROR)
//! - CQ_SET_CAPACITY_MISMATCH (ERROR)
//! - CQ_SET_CAPACITY_EXCEEDED (ERROR)
//! - CQ_SET_ARENA_EXHAUSTED (ERROR)

use std::fmt;

/// Integer-set error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UintSetErrorCode {
    /// Value outside `[0, capacity)`
    OutOfBounds,
    /// Binary operation on sets of different capacity
    CapacityMismatch,
    /// Requested capacity above what the implementation supports
    CapacityExceeded,
    /// No room left in the arena until the next reset
    ArenaExhausted,
}

impl UintSetErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            UintSetErrorCode::OutOfBounds => "CQ_SET_OUT_OF_BOUNDS",
            UintSetErrorCode::CapacityMismatch => "CQ_SET_CAPACITY_MISMATCH",
            UintSetErrorCode::CapacityExceeded => "CQ_SET_CAPACITY_EXCEEDED",
            UintSetErrorCode::ArenaExhausted => "CQ_SET_ARENA_EXHAUSTED",
        }
    }
}

impl fmt::Display for UintSetErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Integer-set error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UintSetError {
    code: UintSetErrorCode,
    message: String,
}

impl UintSetError {
    /// Value doesn't fit the set
    pub fn out_of_bounds(value: usize, cap: usize) -> Self {
        Self {
            code: UintSetErrorCode::OutOfBounds,
            message: format!("Value {} out of bounds for capacity {}.", value, cap),
        }
    }

    /// Capacities of two operands differ
    pub fn capacity_mismatch(a: usize, b: usize) -> Self {
        Self {
            code: UintSetErrorCode::CapacityMismatch,
            message: format!("Capacities {} and {} don't match.", a, b),
        }
    }

    /// Capacity above the implementation maximum
    pub fn capacity_exceeded(cap: usize, max: usize) -> Self {
        Self {
            code: UintSetErrorCode::CapacityExceeded,
            message: format!("Capacity {} greater than maximum capacity of {}.", cap, max),
        }
    }

    /// Arena out of memory
    pub fn arena_exhausted(requested: usize, available: usize) -> Self {
        Self {
            code: UintSetErrorCode::ArenaExhausted,
            message: format!(
                "Arena exhausted: requested {} slots, {} available.",
                requested, available
            ),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> UintSetErrorCode {
        self.code
    }

    /// Returns the message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for UintSetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ERROR] {}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for UintSetError {}

/// Result type for integer-set operations
pub type UintSetResult<T> = Result<T, UintSetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = UintSetError::out_of_bounds(40, 32);
        let display = err.to_string();

        assert!(display.contains("CQ_SET_OUT_OF_BOUNDS"));
        assert!(display.contains("40"));
        assert_eq!(err.code(), UintSetErrorCode::OutOfBounds);
    }
}

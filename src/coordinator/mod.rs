//! Query execution coordinator
//!
//! Drives queries through the asynchronous pipeline:
//!
//! 1. Load every property the query and its display need, plus the sorter
//! 2. Evaluate the query against every record
//! 3. Order the matches
//!
//! Identical concurrent requests share one execution. A failed attempt is
//! logged and run once more before the error reaches the caller; a stale
//! dataset is recovered from this way.

mod errors;
mod executor;
mod result;

pub use errors::{ExecutionError, ExecutionResult};
pub use executor::{ExecutionKey, ExecutionSettings, QueryExecutor};
pub use result::QueryResult;

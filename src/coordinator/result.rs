//! Query execution results

use serde::Serialize;

use crate::hashing::QueryHash;
use crate::index::SortOrder;

/// Ordered result of one execution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub hash: QueryHash,
    pub order: SortOrder,
    pub ascending: bool,
    /// Matching record indices in result order
    pub records: Vec<usize>,
    /// First matching version of each record, parallel to `records`
    pub versions: Vec<usize>,
    /// Display names, parallel to `records`
    pub names: Vec<String>,
}

impl QueryResult {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

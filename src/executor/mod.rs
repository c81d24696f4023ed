//! Query evaluation
//!
//! Runs a condition tree against the loaded catalog, one record at a time.
//!
//! # Evaluation Flow
//!
//! 1. Pick a version-set implementation from the record's version count
//! 2. Start from the full set of versions
//! 3. Narrow the set node by node through the condition tree
//! 4. Report the lowest surviving version, if any
//!
//! Evaluation is synchronous and reads only data already loaded; the
//! coordinator guarantees every property a query needs is present first.

mod compare;
mod errors;
mod evaluator;

pub use compare::{is_super_set, mana_cost_eq, matches_datum, matches_values};
pub use errors::{EvalError, EvalErrorCode, EvalResult};
pub use evaluator::{find_matching_records, QueryEvaluator, RecordMatches, VersionMatches};

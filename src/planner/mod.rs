//! Query planner
//!
//! Rewrites parsed queries into a canonical minimal form before evaluation
//! and merges several queries (a card pool and a user query, say) into one.
//!
//! Simplification is idempotent and never changes which records a query
//! matches.

mod simplifier;

pub use simplifier::{combine_with_conjunction, simplify, SubsetsById};

//! Sort indices
//!
//! Result ordering for every sort order except `name` comes from a
//! precomputed binary index produced offline alongside the property payloads.
//! Indices are decoded once per sort order and cached by the card store.
//!
//! # Invariants
//!
//! - Entries within a group keep dataset (name) order
//! - Direction reverses group order only
//! - Every returned record is present in the match map
//! - Record indices beyond the dataset are counted and logged, never fatal

mod errors;
mod sort_index;
mod sorter;
mod writer;

pub use errors::{IndexError, IndexErrorCode, IndexResult};
pub use sort_index::{SortIndex, SortIndexKind, SORT_INDEX_MAGIC, SORT_INDEX_VERSION};
pub use sorter::{SortOrder, Sorter};
pub use writer::SortIndexWriter;

//! Card catalog
//!
//! Card data is stored column-wise: one JSON payload per property, one entry
//! per record. Card-level properties hold one value (or one per face) per
//! record; per-version properties hold one value per printed version.
//!
//! - [`CardDataProvider`]: synchronous read interface used by the evaluator
//! - [`Catalog`]: decoded columns plus derived search columns
//! - [`CardStore`]: async loading with shared in-flight loads and stale
//!   snapshot detection
//! - [`DataSource`]: where files come from ([`FsDataSource`], [`MemoryDataSource`])

mod columns;
mod errors;
mod provider;
mod source;
mod store;
mod text;

pub use columns::{Catalog, PropertyPayload};
pub use errors::{LoadError, LoadResult};
pub use provider::{CardDataProvider, Datum, Values};
pub use source::{DataSource, FsDataSource, MemoryDataSource};
pub use store::{CardStore, PropertyLoad, SorterLoad};
pub use text::remove_parenthesized_text;

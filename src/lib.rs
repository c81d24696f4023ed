//! cardquery - a deterministic query engine for trading-card catalogs
//!
//! Queries are written in a compact search language, parsed into immutable
//! condition trees, simplified, hashed and evaluated against a columnar,
//! lazily loaded card catalog. Results are ordered by name or by precomputed
//! sort indices.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod executor;
pub mod hashing;
pub mod index;
pub mod observability;
pub mod parser;
pub mod planner;
pub mod pools;
pub mod query;
pub mod uint_set;

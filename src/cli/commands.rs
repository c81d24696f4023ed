//! CLI command implementations
//!
//! Commands build the engine from configuration, run on a current-thread
//! runtime (the card store is single-threaded) and print one JSON response.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use serde_json::{json, Value};

use crate::catalog::{CardDataProvider, CardStore, FsDataSource};
use crate::config::EngineConfig;
use crate::coordinator::{ExecutionSettings, QueryExecutor};
use crate::executor::find_matching_records;
use crate::hashing::QueryHash;
use crate::index::SortOrder;
use crate::observability::MetricsRegistry;
use crate::parser::parse_query;
use crate::planner::{combine_with_conjunction, simplify};
use crate::pools::CardPool;
use crate::query::{Prop, Query, SubsetStore};
use crate::uint_set::SetSelection;

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::write_response;

/// Queries timed by `bench`, covering card-level and per-version leaves
const BENCH_QUERIES: [&str; 5] = [
    "t:creature",
    "c>=rg cmc<=3",
    "s:lea or s:leb",
    "-is:reprint r>=rare",
    "o:draw -t:instant",
];

/// Dispatch a parsed command
pub fn run_command(command: Command) -> CliResult<()> {
    match command {
        Command::Query {
            config,
            data_dir,
            sort,
            desc,
            pool,
            subsets,
            query,
        } => {
            let config = resolve_config(config, data_dir)?;
            let order = match sort {
                Some(sort) => SortOrder::parse(&sort)
                    .ok_or_else(|| CliError::invalid_argument(format!("Unknown sort order: {}", sort)))?,
                None => config.default_sort_order,
            };
            let pool = pool
                .map(|name| {
                    CardPool::parse(&name)
                        .ok_or_else(|| CliError::invalid_argument(format!("Unknown pool: {}", name)))
                })
                .transpose()?;

            let subsets = define_subsets(&subsets)?;
            let query = prepare_query(&subsets, pool, &query);
            execute(&config, subsets, &query, order, !desc)
        }

        Command::Parse { subsets, query } => {
            let subsets = define_subsets(&subsets)?;
            let query = prepare_query(&subsets, None, &query);
            write_response(describe(&query)?)
        }

        Command::Bench {
            config,
            data_dir,
            iterations,
        } => {
            let config = resolve_config(config, data_dir)?;
            bench(&config, iterations)
        }
    }
}

/// Configuration file (or defaults) with command-line overrides applied
fn resolve_config(path: Option<PathBuf>, data_dir: Option<PathBuf>) -> CliResult<EngineConfig> {
    let mut config = match path {
        Some(path) => EngineConfig::load(&path)?,
        None => EngineConfig::default(),
    };

    if let Some(data_dir) = data_dir {
        config.data_dir = data_dir;
    }
    Ok(config)
}

/// Build subsets from `NAME=QUERY` definitions, in order
pub(crate) fn define_subsets(definitions: &[String]) -> CliResult<SubsetStore> {
    let mut subsets = SubsetStore::new();

    for definition in definitions {
        let (name, text) = definition.split_once('=').ok_or_else(|| {
            CliError::invalid_argument(format!("Subset must be NAME=QUERY: {}", definition))
        })?;
        let name = name.trim();
        if name.is_empty() {
            return Err(CliError::invalid_argument(format!("Subset without name: {}", definition)));
        }

        let parsed = parse_query(subsets.name_to_subset(), text);
        let query = simplify(subsets.id_to_subset(), &parsed);

        if subsets.create_named(name, query).is_none() {
            return Err(CliError::invalid_argument(format!("Subset defined twice: {}", name)));
        }
    }

    Ok(subsets)
}

/// Parse the query text, restrict it to a pool and simplify the result
pub(crate) fn prepare_query(subsets: &SubsetStore, pool: Option<CardPool>, text: &str) -> Query {
    let mut queries = Vec::with_capacity(2);
    if let Some(pool) = pool {
        queries.push(pool.query());
    }
    queries.push(parse_query(subsets.name_to_subset(), text));

    let combined = combine_with_conjunction(subsets.id_to_subset(), &queries);
    simplify(subsets.id_to_subset(), &combined)
}

fn describe(query: &Query) -> CliResult<Value> {
    Ok(json!({
        "condition": serde_json::to_value(&query.condition)?,
        "props": query.props.iter().map(|p| p.as_str()).collect::<Vec<_>>(),
        "hash": QueryHash::of(query).to_string(),
    }))
}

fn runtime() -> CliResult<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::io_error(format!("Failed to start runtime: {}", e)))
}

fn card_store(config: &EngineConfig, metrics: Arc<MetricsRegistry>) -> CardStore {
    let source = Rc::new(FsDataSource::new(config.data_dir.clone()));
    CardStore::with_metrics(source, config.refetch_interval(), metrics)
}

fn execute(
    config: &EngineConfig,
    subsets: SubsetStore,
    query: &Query,
    order: SortOrder,
    ascending: bool,
) -> CliResult<()> {
    let store = card_store(config, Arc::new(MetricsRegistry::new()));
    let executor = QueryExecutor::new(
        store,
        Rc::new(RefCell::new(subsets)),
        ExecutionSettings::from(config),
    );

    let result = runtime()?.block_on(executor.execute(query, order, ascending))?;

    write_response(json!({
        "hash": result.hash.to_string(),
        "count": result.len(),
        "names": result.names,
    }))
}

fn bench(config: &EngineConfig, iterations: u32) -> CliResult<()> {
    let store = card_store(config, Arc::new(MetricsRegistry::new()));
    runtime()?
        .block_on(store.load_all(Prop::ALL))
        .map_err(|e| CliError::execution_failed(e.to_string()))?;

    let subsets = SubsetStore::new();
    let queries: Vec<Query> = BENCH_QUERIES
        .iter()
        .map(|text| prepare_query(&subsets, None, text))
        .collect();

    let catalog = store.catalog();
    let mut results = Vec::new();

    for small_set_optimization in [true, false] {
        for bitset in [true, false] {
            let selection = SetSelection {
                small_set_optimization,
                bitset,
            };
            let started = Instant::now();
            let mut matches = 0;

            for _ in 0..iterations {
                for query in &queries {
                    matches += find_matching_records(
                        &*catalog,
                        &subsets,
                        query,
                        selection,
                        config.arena_bytes,
                    )
                    .map_err(|e| CliError::execution_failed(e.to_string()))?
                    .len();
                }
            }

            results.push(json!({
                "small_set_optimization": small_set_optimization,
                "bitset": bitset,
                "elapsed_ms": started.elapsed().as_millis() as u64,
                "matches": matches,
            }));
        }
    }

    write_response(json!({
        "records": catalog.length().unwrap_or(0),
        "iterations": iterations,
        "queries": BENCH_QUERIES,
        "results": results,
    }))
}

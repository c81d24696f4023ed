//! Single-flight query execution
//!
//! One execution runs the pipeline load -> evaluate -> sort. Executions are
//! keyed by query hash, sort order and direction; a request whose key is
//! already in flight awaits that execution instead of starting its own. The
//! entry is removed when the execution finishes, successfully or not.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::rc::{Rc, Weak};
use std::sync::Arc;

use futures_util::future::{self, FutureExt, LocalBoxFuture, Shared};

use super::errors::{ExecutionError, ExecutionResult};
use super::result::QueryResult;
use crate::catalog::{CardDataProvider, CardStore};
use crate::config::EngineConfig;
use crate::executor::find_matching_records;
use crate::hashing::QueryHash;
use crate::index::SortOrder;
use crate::observability::{log_event, Event, MetricsRegistry, ObservationScope};
use crate::query::{Prop, Query, SubsetStore};
use crate::uint_set::{SetSelection, DEFAULT_ARENA_BYTES};

/// Knobs of the execution pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionSettings {
    pub selection: SetSelection,
    pub arena_bytes: usize,
    /// Attempts per execution, at least 1
    pub max_attempts: u32,
    /// Loaded for every query so results can be displayed
    pub display_props: Vec<Prop>,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            selection: SetSelection::default(),
            arena_bytes: DEFAULT_ARENA_BYTES,
            max_attempts: 2,
            display_props: vec![Prop::Name],
        }
    }
}

impl From<&EngineConfig> for ExecutionSettings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            selection: config.set_selection(),
            arena_bytes: config.arena_bytes,
            max_attempts: config.max_attempts.max(1),
            ..Self::default()
        }
    }
}

/// Identity of an execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExecutionKey {
    pub hash: QueryHash,
    pub order: SortOrder,
    pub ascending: bool,
}

type SharedExecution = Shared<LocalBoxFuture<'static, ExecutionResult<Rc<QueryResult>>>>;
type InFlight = RefCell<HashMap<ExecutionKey, SharedExecution>>;

/// Everything one pipeline run needs
#[derive(Clone)]
struct Pipeline {
    store: CardStore,
    subsets: Rc<RefCell<SubsetStore>>,
    settings: Rc<ExecutionSettings>,
}

/// Executes queries against a card store.
///
/// Cheap to clone; clones share the store, the subsets and the in-flight map.
#[derive(Clone)]
pub struct QueryExecutor {
    pipeline: Pipeline,
    in_flight: Rc<InFlight>,
}

impl QueryExecutor {
    pub fn new(
        store: CardStore,
        subsets: Rc<RefCell<SubsetStore>>,
        settings: ExecutionSettings,
    ) -> Self {
        Self {
            pipeline: Pipeline {
                store,
                subsets,
                settings: Rc::new(settings),
            },
            in_flight: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    pub fn store(&self) -> &CardStore {
        &self.pipeline.store
    }

    pub fn subsets(&self) -> Rc<RefCell<SubsetStore>> {
        self.pipeline.subsets.clone()
    }

    pub fn settings(&self) -> &ExecutionSettings {
        &self.pipeline.settings
    }

    pub fn metrics(&self) -> Arc<MetricsRegistry> {
        self.pipeline.store.metrics()
    }

    /// Number of executions currently running
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.borrow().len()
    }

    /// Execute a query, or join the identical execution already running.
    ///
    /// The query must list every property it reads, including those of the
    /// subsets it references; simplified queries do.
    pub async fn execute(
        &self,
        query: &Query,
        order: SortOrder,
        ascending: bool,
    ) -> ExecutionResult<Rc<QueryResult>> {
        let key = ExecutionKey {
            hash: QueryHash::of(query),
            order,
            ascending,
        };

        let running = self.in_flight.borrow().get(&key).cloned();
        if let Some(execution) = running {
            log_event(Event::QueryDeduplicated, &[("hash", &key.hash.to_string())]);
            self.metrics().increment_queries_deduplicated();
            return execution.await;
        }

        let execution = run(
            self.pipeline.clone(),
            query.clone(),
            key,
            Rc::downgrade(&self.in_flight),
        )
        .boxed_local()
        .shared();

        self.in_flight.borrow_mut().insert(key, execution.clone());
        execution.await
    }

    /// Load properties and a sorter ahead of the first query
    pub async fn preload(
        &self,
        props: impl IntoIterator<Item = Prop>,
        order: SortOrder,
    ) -> ExecutionResult<()> {
        let store = &self.pipeline.store;
        let props: BTreeSet<Prop> = props
            .into_iter()
            .chain(self.pipeline.settings.display_props.iter().copied())
            .collect();

        future::try_join(store.load_all(props), store.sorter(order)).await?;
        Ok(())
    }
}

/// Run the pipeline with bounded retry, then leave the in-flight map
async fn run(
    pipeline: Pipeline,
    query: Query,
    key: ExecutionKey,
    in_flight: Weak<InFlight>,
) -> ExecutionResult<Rc<QueryResult>> {
    let hash = key.hash.to_string();
    let metrics = pipeline.store.metrics();
    let scope = ObservationScope::with_fields(
        "QUERY_EXECUTE",
        vec![
            ("hash", hash.clone()),
            ("order", key.order.to_string()),
            ("ascending", key.ascending.to_string()),
        ],
    );

    let max_attempts = pipeline.settings.max_attempts.max(1);
    let mut attempt = 1;

    let result = loop {
        match pipeline.attempt(&query, key).await {
            Ok(result) => break Ok(result),
            Err(err) if attempt < max_attempts => {
                log_event(
                    Event::QueryAttemptFailed,
                    &[
                        ("hash", &hash),
                        ("attempt", &attempt.to_string()),
                        ("error", &err.to_string()),
                    ],
                );
                metrics.increment_attempts_retried();
                attempt += 1;
            }
            Err(err) => break Err(err),
        }
    };

    if let Some(in_flight) = in_flight.upgrade() {
        in_flight.borrow_mut().remove(&key);
    }

    match result {
        Ok(result) => {
            metrics.increment_queries_executed();
            scope.complete(&[("count", &result.len().to_string())]);
            Ok(Rc::new(result))
        }
        Err(err) => {
            let message = err.to_string();
            log_event(
                Event::QueryFailed,
                &[("hash", &hash), ("attempts", &attempt.to_string()), ("error", &message)],
            );
            metrics.increment_queries_failed();
            scope.fail(&message);
            Err(err)
        }
    }
}

impl Pipeline {
    async fn attempt(&self, query: &Query, key: ExecutionKey) -> ExecutionResult<QueryResult> {
        let props: BTreeSet<Prop> = query
            .props
            .iter()
            .chain(&self.settings.display_props)
            .copied()
            .collect();

        let (_, sorter) =
            future::try_join(self.store.load_all(props), self.store.sorter(key.order)).await?;

        let catalog = self.store.catalog();
        let subsets = self.subsets.borrow();
        let matches = find_matching_records(
            &*catalog,
            &subsets,
            query,
            self.settings.selection,
            self.settings.arena_bytes,
        )
        .map_err(ExecutionError::from)?;

        let len = catalog.length().unwrap_or(0);
        self.store.metrics().add_records_evaluated(len as u64);

        let records = sorter.sort(&matches, len, key.ascending);
        let versions = records
            .iter()
            .map(|idx| matches.get(idx).copied().unwrap_or(0))
            .collect();
        let names = records
            .iter()
            .map(|&idx| catalog.name(idx).unwrap_or_default())
            .collect();

        Ok(QueryResult {
            hash: key.hash,
            order: key.order,
            ascending: key.ascending,
            records,
            versions,
            names,
        })
    }
}

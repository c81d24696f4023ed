//! Asynchronous card store
//!
//! Loads property payloads and sort indices on demand and caches them for the
//! life of the snapshot. Concurrent requests for the same file share one
//! in-flight load.
//!
//! # Snapshot agreement
//!
//! The first payload or index loaded fixes the snapshot creation time. A later
//! file with a different creation time means the files on the source were
//! replaced mid-session. When the last forced refetch is at least
//! `refetch_interval` ago, every in-flight load is aborted, all loaded data is
//! dropped and later fetches ask the source to bypass its caches. Either way
//! the load fails with [`LoadError::Stale`] so the caller can run again.
//!
//! Single-threaded: the store is `!Send` and every borrow of its state ends
//! before the next await point.

use std::cell::{Ref, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::{self, AbortHandle, Abortable, FutureExt, LocalBoxFuture, Shared};

use super::columns::{Catalog, PropertyPayload};
use super::errors::{LoadError, LoadResult};
use super::provider::CardDataProvider;
use super::source::DataSource;
use crate::index::{SortIndex, SortOrder, Sorter};
use crate::observability::{log_event, Event, MetricsRegistry};
use crate::query::Prop;

/// Shared handle to a property load
pub type PropertyLoad = Shared<LocalBoxFuture<'static, LoadResult<()>>>;

/// Shared handle to a sorter load
pub type SorterLoad = Shared<LocalBoxFuture<'static, LoadResult<Rc<Sorter>>>>;

struct StoreState {
    catalog: Catalog,
    loads: HashMap<Prop, PropertyLoad>,
    sorters: HashMap<SortOrder, SorterLoad>,
    creation_time: Option<u64>,
    aborts: Vec<AbortHandle>,
    reload: bool,
    last_clear: Instant,
    refetch_interval: Duration,
    /// Bumped on every clear; loads started before a clear are discarded
    generation: u64,
    metrics: Arc<MetricsRegistry>,
}

impl StoreState {
    fn check_snapshot(&mut self, creation_time: u64) -> LoadResult<()> {
        match self.creation_time {
            None => {
                self.creation_time = Some(creation_time);
                Ok(())
            }
            Some(expected) if expected == creation_time => Ok(()),
            Some(expected) => Err(self.out_of_date(expected, creation_time)),
        }
    }

    fn out_of_date(&mut self, expected: u64, actual: u64) -> LoadError {
        let expected_str = expected.to_string();
        let actual_str = actual.to_string();
        log_event(
            Event::DatasetStale,
            &[("expected", &expected_str), ("actual", &actual_str)],
        );

        if self.last_clear.elapsed() >= self.refetch_interval {
            for handle in self.aborts.drain(..) {
                handle.abort();
            }

            self.catalog.clear();
            self.loads.clear();
            self.sorters.clear();
            self.creation_time = None;
            self.reload = true;
            self.last_clear = Instant::now();
            self.generation += 1;
            self.metrics.increment_stale_refetches();

            let generation = self.generation.to_string();
            log_event(Event::DatasetRefetch, &[("generation", &generation)]);
        }

        LoadError::Stale { expected, actual }
    }

    fn accept_payload(&mut self, prop: Prop, payload: PropertyPayload) -> LoadResult<()> {
        self.check_snapshot(payload.creation_time)?;
        self.catalog.insert(prop, payload.data)?;

        let records = self.catalog.length().unwrap_or(0).to_string();
        log_event(
            Event::PropertyLoaded,
            &[("prop", prop.as_str()), ("records", &records)],
        );
        Ok(())
    }

    fn accept_index(&mut self, order: SortOrder, index: &SortIndex) -> LoadResult<()> {
        self.check_snapshot(index.creation_time())?;

        let entries = index.entry_count().to_string();
        log_event(
            Event::SortIndexLoaded,
            &[("order", order.as_str()), ("entries", &entries)],
        );
        Ok(())
    }
}

/// Lazily loaded, shared card data
#[derive(Clone)]
pub struct CardStore {
    state: Rc<RefCell<StoreState>>,
    source: Rc<dyn DataSource>,
}

impl CardStore {
    pub fn new(source: Rc<dyn DataSource>, refetch_interval: Duration) -> Self {
        Self::with_metrics(source, refetch_interval, Arc::new(MetricsRegistry::new()))
    }

    pub fn with_metrics(
        source: Rc<dyn DataSource>,
        refetch_interval: Duration,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        let state = StoreState {
            catalog: Catalog::new(),
            loads: HashMap::new(),
            sorters: HashMap::new(),
            creation_time: None,
            aborts: Vec::new(),
            reload: false,
            last_clear: Instant::now(),
            refetch_interval,
            generation: 0,
            metrics,
        };

        Self {
            state: Rc::new(RefCell::new(state)),
            source,
        }
    }

    /// Read access to the loaded columns.
    ///
    /// Don't hold the guard across an await point.
    pub fn catalog(&self) -> Ref<'_, Catalog> {
        Ref::map(self.state.borrow(), |state| &state.catalog)
    }

    pub fn length(&self) -> Option<usize> {
        self.state.borrow().catalog.length()
    }

    /// Creation time of the loaded snapshot, once anything is loaded
    pub fn creation_time(&self) -> Option<u64> {
        self.state.borrow().creation_time
    }

    /// Whether fetches bypass source caches after a stale snapshot
    pub fn is_reloading(&self) -> bool {
        self.state.borrow().reload
    }

    pub fn metrics(&self) -> Arc<MetricsRegistry> {
        self.state.borrow().metrics.clone()
    }

    /// Load a property, or join its in-flight load.
    ///
    /// Derived properties load their source. `reprint` has no payload: it
    /// joins any per-version load already started, or loads `set`, so that
    /// version counts are known.
    pub fn load(&self, prop: Prop) -> PropertyLoad {
        let prop = match prop {
            Prop::Reprint => {
                let state = self.state.borrow();
                let existing = Prop::PER_VERSION.iter().find_map(|p| state.loads.get(p));

                if let Some(load) = existing {
                    return load.clone();
                }
                Prop::Set
            }
            other => other.source(),
        };

        if let Some(load) = self.state.borrow().loads.get(&prop) {
            return load.clone();
        }

        let name = PropertyPayload::file_name(prop);
        let (reload, generation) = {
            let state = self.state.borrow();
            (state.reload, state.generation)
        };
        let state = Rc::downgrade(&self.state);
        let source = self.source.clone();
        let file = name.clone();

        let fetch = async move {
            let result = fetch_payload(&*source, &file, reload)
                .await
                .and_then(|payload| with_state(&state, generation, &file, |s| s.accept_payload(prop, payload)));

            if result.is_err() {
                forget(&state, generation, |s| {
                    s.loads.remove(&prop);
                });
            }
            result
        };

        self.register(fetch, name, |state, load| {
            state.loads.insert(prop, load);
        })
    }

    /// Load several properties; fails with the first error
    pub async fn load_all(&self, props: impl IntoIterator<Item = Prop>) -> LoadResult<()> {
        let loads: Vec<PropertyLoad> = props.into_iter().map(|prop| self.load(prop)).collect();
        future::try_join_all(loads).await?;
        Ok(())
    }

    /// Sorter for an order, loading its index on first use
    pub fn sorter(&self, order: SortOrder) -> SorterLoad {
        if let Some(load) = self.state.borrow().sorters.get(&order) {
            return load.clone();
        }

        let name = match order.file_name() {
            Some(name) => name,
            None => {
                let load = future::ready(Ok(Rc::new(Sorter::Name))).boxed_local().shared();
                self.state.borrow_mut().sorters.insert(order, load.clone());
                return load;
            }
        };

        let (reload, generation) = {
            let state = self.state.borrow();
            (state.reload, state.generation)
        };
        let state = Rc::downgrade(&self.state);
        let source = self.source.clone();
        let file = name.clone();

        let fetch = async move {
            let result = fetch_sorter(&*source, &file, reload, order)
                .await
                .and_then(|index| {
                    with_state(&state, generation, &file, |s| s.accept_index(order, &index))?;
                    Sorter::from_index(order, index)
                        .map(Rc::new)
                        .map_err(|source| LoadError::Index {
                            name: file.clone(),
                            source,
                        })
                });

            if result.is_err() {
                forget(&state, generation, |s| {
                    s.sorters.remove(&order);
                });
            }
            result
        };

        self.register(fetch, name, |state, load| {
            state.sorters.insert(order, load);
        })
    }

    /// Make a load abortable and shared, and record it
    fn register<T: Clone + 'static>(
        &self,
        fetch: impl std::future::Future<Output = LoadResult<T>> + 'static,
        name: String,
        record: impl FnOnce(&mut StoreState, Shared<LocalBoxFuture<'static, LoadResult<T>>>),
    ) -> Shared<LocalBoxFuture<'static, LoadResult<T>>> {
        let (handle, registration) = AbortHandle::new_pair();
        let load = Abortable::new(fetch, registration)
            .map(move |result| result.unwrap_or_else(|_| Err(LoadError::Aborted(name))))
            .boxed_local()
            .shared();

        let mut state = self.state.borrow_mut();
        state.aborts.push(handle);
        record(&mut *state, load.clone());
        load
    }
}

async fn fetch_payload(source: &dyn DataSource, name: &str, reload: bool) -> LoadResult<PropertyPayload> {
    let bytes = source.fetch(name, reload).await?;
    serde_json::from_slice(&bytes).map_err(|e| LoadError::Decode {
        name: name.to_string(),
        message: e.to_string(),
    })
}

async fn fetch_sorter(
    source: &dyn DataSource,
    name: &str,
    reload: bool,
    order: SortOrder,
) -> LoadResult<SortIndex> {
    let bytes = source.fetch(name, reload).await?;
    SortIndex::decode(bytes).map_err(|source| LoadError::Index {
        name: format!("{} ({})", name, order),
        source,
    })
}

/// Run `f` on the store state if the store is alive and hasn't been cleared
/// since the load started
fn with_state<T>(
    state: &Weak<RefCell<StoreState>>,
    generation: u64,
    name: &str,
    f: impl FnOnce(&mut StoreState) -> LoadResult<T>,
) -> LoadResult<T> {
    let state = state
        .upgrade()
        .ok_or_else(|| LoadError::Aborted(name.to_string()))?;
    let mut state = state.borrow_mut();

    if state.generation != generation {
        return Err(LoadError::Aborted(name.to_string()));
    }
    f(&mut state)
}

/// Drop a failed load so the next request fetches again
fn forget(state: &Weak<RefCell<StoreState>>, generation: u64, f: impl FnOnce(&mut StoreState)) {
    if let Some(state) = state.upgrade() {
        let mut state = state.borrow_mut();

        if state.generation == generation {
            f(&mut state);
        }
    }
}

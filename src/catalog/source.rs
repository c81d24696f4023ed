//! Where property payloads and sort indices come from

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use futures_util::future::{FutureExt, LocalBoxFuture};

use super::errors::{LoadError, LoadResult};

/// Asynchronous source of named data files.
///
/// `reload` asks the source to bypass any cache it keeps; it is set once the
/// store has detected a stale snapshot.
pub trait DataSource {
    fn fetch(&self, name: &str, reload: bool) -> LocalBoxFuture<'_, LoadResult<Vec<u8>>>;
}

/// Reads files from a directory
#[derive(Debug, Clone)]
pub struct FsDataSource {
    dir: PathBuf,
}

impl FsDataSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DataSource for FsDataSource {
    /// Files are read fresh every time, so `reload` has nothing to bypass.
    fn fetch(&self, name: &str, _reload: bool) -> LocalBoxFuture<'_, LoadResult<Vec<u8>>> {
        let path = self.dir.join(name);
        let name = name.to_string();

        async move {
            tokio::fs::read(&path).await.map_err(|e| LoadError::Io {
                name,
                message: e.to_string(),
            })
        }
        .boxed_local()
    }
}

/// In-memory files, with a log of every fetch
#[derive(Debug, Default)]
pub struct MemoryDataSource {
    files: RefCell<HashMap<String, Vec<u8>>>,
    fetches: RefCell<Vec<(String, bool)>>,
}

impl MemoryDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file
    pub fn insert(&self, name: impl Into<String>, contents: impl Into<Vec<u8>>) {
        self.files.borrow_mut().insert(name.into(), contents.into());
    }

    pub fn remove(&self, name: &str) -> Option<Vec<u8>> {
        self.files.borrow_mut().remove(name)
    }

    /// Every fetch so far as `(name, reload)`, oldest first
    pub fn fetches(&self) -> Vec<(String, bool)> {
        self.fetches.borrow().clone()
    }

    /// Number of fetches of one file
    pub fn fetch_count(&self, name: &str) -> usize {
        self.fetches.borrow().iter().filter(|(n, _)| n == name).count()
    }
}

impl DataSource for MemoryDataSource {
    /// Yields once before answering so concurrent callers overlap as they
    /// would on real I/O.
    fn fetch(&self, name: &str, reload: bool) -> LocalBoxFuture<'_, LoadResult<Vec<u8>>> {
        self.fetches.borrow_mut().push((name.to_string(), reload));
        let name = name.to_string();

        async move {
            tokio::task::yield_now().await;

            self.files
                .borrow()
                .get(&name)
                .cloned()
                .ok_or_else(|| LoadError::Io {
                    message: "no such file".to_string(),
                    name,
                })
        }
        .boxed_local()
    }
}

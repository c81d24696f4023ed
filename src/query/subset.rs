//! Named, stored queries
//!
//! Subsets are referenced from other queries by id (`Condition::Subset`) and
//! looked up by name while parsing. Replacing a subset through
//! [`SubsetStore::update`] changes what every referencing query matches without
//! re-parsing those queries.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use super::condition::Query;
use crate::observability::{log_event, Event};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subset {
    pub id: String,
    pub name: String,
    pub query: Query,
}

impl Subset {
    pub fn new(id: impl Into<String>, name: impl Into<String>, query: Query) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            query,
        }
    }
}

/// Subsets indexed both by id and by name
#[derive(Debug, Default)]
pub struct SubsetStore {
    id_to_subset: HashMap<String, Arc<Subset>>,
    name_to_subset: HashMap<String, Arc<Subset>>,
}

impl SubsetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id_to_subset(&self) -> &HashMap<String, Arc<Subset>> {
        &self.id_to_subset
    }

    pub fn name_to_subset(&self) -> &HashMap<String, Arc<Subset>> {
        &self.name_to_subset
    }

    pub fn get(&self, id: &str) -> Option<Arc<Subset>> {
        self.id_to_subset.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.id_to_subset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_subset.is_empty()
    }

    /// Existing subset, or a new one matching nothing and named after its id
    pub fn get_or_create(&mut self, id: &str) -> Arc<Subset> {
        match self.id_to_subset.get(id) {
            Some(subset) => subset.clone(),
            None => self.insert(Subset::new(id, id, Query::none())),
        }
    }

    /// Create a subset; `None` when the id or the name is already taken
    pub fn create(&mut self, id: &str, name: &str, query: Query) -> Option<Arc<Subset>> {
        if self.id_to_subset.contains_key(id) {
            log_event(Event::SubsetConflict, &[("id", id)]);
            return None;
        }

        if self.name_to_subset.contains_key(name) {
            log_event(Event::SubsetConflict, &[("name", name)]);
            return None;
        }

        Some(self.insert(Subset::new(id, name, query)))
    }

    /// Create a subset under a freshly generated id
    pub fn create_named(&mut self, name: &str, query: Query) -> Option<Arc<Subset>> {
        let id = Uuid::new_v4().to_string();
        self.create(&id, name, query)
    }

    /// Replace the subset with the same id, dropping its old name mapping
    pub fn update(&mut self, subset: Subset) -> Arc<Subset> {
        if let Some(old) = self.id_to_subset.get(&subset.id) {
            let old_name = old.name.clone();
            self.name_to_subset.remove(&old_name);
        }

        self.insert(subset)
    }

    fn insert(&mut self, subset: Subset) -> Arc<Subset> {
        let subset = Arc::new(subset);
        self.id_to_subset.insert(subset.id.clone(), subset.clone());
        self.name_to_subset.insert(subset.name.clone(), subset.clone());
        subset
    }
}

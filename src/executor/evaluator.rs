//! Per-record query evaluation
//!
//! Each record starts with the full set of its versions. Walking the
//! condition tree narrows that set: structural nodes combine subsets of it,
//! leaves on per-version properties drop the versions that fail, and leaves on
//! card-level properties keep or clear the whole set. A record matches when
//! any version survives; its lowest surviving version is the one reported.

use std::collections::HashMap;

use super::compare::matches_values;
use super::errors::{EvalError, EvalResult};
use crate::catalog::CardDataProvider;
use crate::observability::{log_event, Event};
use crate::query::{Condition, Prop, Query, SubsetStore};
use crate::uint_set::{
    ArraySet, ArraySetArena, Bitset, Bitset32, BitsetArena, SetKind, SetSelection, UintSet,
};

/// Record index to the first matching version of that record
pub type RecordMatches = HashMap<usize, usize>;

/// Versions of one record that satisfy the query.
///
/// Arena-backed variants borrow the evaluator's arena and are invalidated by
/// the next call to [`QueryEvaluator::evaluate`].
#[derive(Debug)]
pub enum VersionMatches<'a> {
    Inline(Bitset32),
    Bitset(Bitset, &'a BitsetArena),
    Array(ArraySet, &'a ArraySetArena),
}

impl VersionMatches<'_> {
    pub fn first_or_null(&self) -> Option<usize> {
        match self {
            VersionMatches::Inline(set) => set.first_or_null(&()),
            VersionMatches::Bitset(set, arena) => set.first_or_null(arena),
            VersionMatches::Array(set, arena) => set.first_or_null(arena),
        }
    }

    pub fn to_vec(&self) -> Vec<usize> {
        match self {
            VersionMatches::Inline(set) => set.to_vec(&()),
            VersionMatches::Bitset(set, arena) => set.to_vec(arena),
            VersionMatches::Array(set, arena) => set.to_vec(arena),
        }
    }

    pub fn size(&self) -> usize {
        match self {
            VersionMatches::Inline(set) => set.size(),
            VersionMatches::Bitset(set, _) => set.size(),
            VersionMatches::Array(set, _) => set.size(),
        }
    }
}

/// Evaluates one query against records of a provider.
///
/// Owns the arenas for version sets; both are reset at the start of every
/// record, so evaluating `n` records allocates nothing after the first.
pub struct QueryEvaluator<'a, P: CardDataProvider + ?Sized> {
    provider: &'a P,
    subsets: &'a SubsetStore,
    query: &'a Query,
    selection: SetSelection,
    bitset_arena: BitsetArena,
    array_arena: ArraySetArena,
}

impl<'a, P: CardDataProvider + ?Sized> QueryEvaluator<'a, P> {
    pub fn new(
        provider: &'a P,
        subsets: &'a SubsetStore,
        query: &'a Query,
        selection: SetSelection,
        arena_bytes: usize,
    ) -> Self {
        Self {
            provider,
            subsets,
            query,
            selection,
            bitset_arena: BitsetArena::new(arena_bytes),
            array_arena: ArraySetArena::new(arena_bytes),
        }
    }

    /// Versions of record `idx` matching the query.
    ///
    /// Records with no per-version data loaded have a single version.
    pub fn evaluate(&mut self, idx: usize) -> EvalResult<VersionMatches<'_>> {
        let version_count = self.provider.version_count(idx).unwrap_or(1);
        let narrowing = Narrowing {
            provider: self.provider,
            subsets: self.subsets,
            idx,
        };
        let query = self.query;
        let condition = &query.condition;

        match self.selection.choose(version_count) {
            SetKind::Inline32 => {
                let mut set = Bitset32::new(version_count)?;
                set.fill(&mut ());
                narrowing.narrow(&mut (), &mut set, condition)?;
                Ok(VersionMatches::Inline(set))
            }
            SetKind::Bitset => {
                let arena = &mut self.bitset_arena;
                arena.reset();
                let mut set = Bitset::with_cap(arena, version_count)?;
                set.fill(arena);
                narrowing.narrow(arena, &mut set, condition)?;
                Ok(VersionMatches::Bitset(set, &self.bitset_arena))
            }
            SetKind::Array => {
                let arena = &mut self.array_arena;
                arena.reset();
                let mut set = ArraySet::with_cap(arena, version_count)?;
                set.fill(arena);
                narrowing.narrow(arena, &mut set, condition)?;
                Ok(VersionMatches::Array(set, &self.array_arena))
            }
        }
    }
}

/// Read-only half of an evaluation, split from the arenas so a set and its
/// arena can be borrowed mutably while the provider is read.
struct Narrowing<'a, P: CardDataProvider + ?Sized> {
    provider: &'a P,
    subsets: &'a SubsetStore,
    idx: usize,
}

impl<P: CardDataProvider + ?Sized> Narrowing<'_, P> {
    /// Remove from `set` every version that fails `condition`
    fn narrow<S: UintSet>(
        &self,
        arena: &mut S::Arena,
        set: &mut S,
        condition: &Condition,
    ) -> EvalResult<()> {
        match condition {
            Condition::True => {}
            Condition::False => set.clear(arena),

            Condition::Not { condition } => {
                let mut matching = set.copy(arena)?;
                self.narrow(arena, &mut matching, condition)?;
                set.diff(arena, &matching)?;
            }

            Condition::Or { conditions } => {
                let candidates = set.copy(arena)?;
                let mut branch = set.copy(arena)?;
                set.clear(arena);

                for child in conditions {
                    candidates.copy_into(arena, &mut branch)?;
                    self.narrow(arena, &mut branch, child)?;
                    set.union(arena, &branch)?;

                    if set.size() == candidates.size() {
                        break;
                    }
                }
            }

            Condition::And { conditions } => {
                for child in conditions {
                    self.narrow(arena, set, child)?;

                    if set.is_empty() {
                        break;
                    }
                }
            }

            Condition::Subset { id } => match self.subsets.get(id) {
                Some(subset) => self.narrow(arena, set, &subset.query.condition)?,
                None => {
                    log_event(Event::SubsetMissing, &[("subset_id", id.as_str())]);
                    set.clear(arena);
                }
            },

            leaf => {
                let Some(prop) = leaf.prop() else {
                    return Ok(());
                };

                if prop.is_per_version() {
                    set.try_retain(arena, |version| self.leaf_matches(leaf, prop, version))?;
                } else if !self.leaf_matches(leaf, prop, 0)? {
                    set.clear(arena);
                }
            }
        }

        Ok(())
    }

    fn leaf_matches(&self, leaf: &Condition, prop: Prop, version: usize) -> EvalResult<bool> {
        matches_values(leaf, self.provider.get_for_version(self.idx, version, prop))
    }
}

/// Evaluate a query against every record of a provider.
///
/// Errors carry the name of the record that failed.
pub fn find_matching_records<P: CardDataProvider + ?Sized>(
    provider: &P,
    subsets: &SubsetStore,
    query: &Query,
    selection: SetSelection,
    arena_bytes: usize,
) -> EvalResult<RecordMatches> {
    let length = provider.length().ok_or_else(EvalError::length_unknown)?;
    let mut evaluator = QueryEvaluator::new(provider, subsets, query, selection, arena_bytes);
    let mut matches = RecordMatches::new();

    for idx in 0..length {
        let first = evaluator
            .evaluate(idx)
            .map_err(|e| {
                let record = provider.name(idx).unwrap_or_else(|| format!("#{}", idx));
                e.in_record(record)
            })?
            .first_or_null();

        if let Some(version) = first {
            matches.insert(idx, version);
        }
    }

    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::executor::EvalErrorCode;
    use crate::query::{CompareOp, Subset, Value};
    use crate::uint_set::DEFAULT_ARENA_BYTES;
    use serde_json::json;
    use std::collections::BTreeSet;

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog
            .insert(
                Prop::Name,
                json!([["Black Lotus"], ["Counterspell"], ["Fire", "Ice"]]),
            )
            .unwrap();
        catalog.insert(Prop::Cmc, json!([0, 2, 2])).unwrap();
        catalog
            .insert(Prop::Set, json!([["lea"], ["lea", "tmp", "mh2"], ["apc"]]))
            .unwrap();
        catalog
    }

    fn query(condition: std::sync::Arc<Condition>) -> Query {
        Query::new(BTreeSet::new(), condition)
    }

    fn set_is(set: &str) -> std::sync::Arc<Condition> {
        Condition::comparison(CompareOp::Eq, Prop::Set, Value::Str(set.to_string()))
    }

    fn cmc_is(n: i32) -> std::sync::Arc<Condition> {
        Condition::comparison(CompareOp::Eq, Prop::Cmc, Value::Int(n))
    }

    fn run(
        catalog: &Catalog,
        subsets: &SubsetStore,
        query: &Query,
        selection: SetSelection,
    ) -> RecordMatches {
        find_matching_records(catalog, subsets, query, selection, DEFAULT_ARENA_BYTES).unwrap()
    }

    fn selections() -> [SetSelection; 3] {
        [
            SetSelection::default(),
            SetSelection {
                small_set_optimization: false,
                bitset: true,
            },
            SetSelection {
                small_set_optimization: false,
                bitset: false,
            },
        ]
    }

    #[test]
    fn test_card_level_leaf() {
        let catalog = catalog();
        let subsets = SubsetStore::new();

        for selection in selections() {
            let matches = run(&catalog, &subsets, &query(cmc_is(2)), selection);
            assert_eq!(matches, RecordMatches::from([(1, 0), (2, 0)]));
        }
    }

    #[test]
    fn test_per_version_leaf_reports_first_version() {
        let catalog = catalog();
        let subsets = SubsetStore::new();

        for selection in selections() {
            let matches = run(&catalog, &subsets, &query(set_is("tmp")), selection);
            assert_eq!(matches, RecordMatches::from([(1, 1)]));
        }
    }

    #[test]
    fn test_not_over_versions() {
        let catalog = catalog();
        let subsets = SubsetStore::new();
        let condition = Condition::and(vec![cmc_is(2), Condition::not(set_is("lea"))]);

        for selection in selections() {
            let matches = run(&catalog, &subsets, &query(condition.clone()), selection);
            assert_eq!(matches, RecordMatches::from([(1, 1), (2, 0)]));
        }
    }

    #[test]
    fn test_or_unions_versions() {
        let catalog = catalog();
        let subsets = SubsetStore::new();
        let condition = Condition::or(vec![set_is("mh2"), set_is("tmp")]);

        for selection in selections() {
            let matches = run(&catalog, &subsets, &query(condition.clone()), selection);
            assert_eq!(matches, RecordMatches::from([(1, 1)]));
        }
    }

    #[test]
    fn test_versions_of_one_record() {
        let catalog = catalog();
        let subsets = SubsetStore::new();
        let query = query(Condition::or(vec![set_is("mh2"), set_is("lea")]));

        for selection in selections() {
            let mut evaluator =
                QueryEvaluator::new(&catalog, &subsets, &query, selection, DEFAULT_ARENA_BYTES);
            let versions = evaluator.evaluate(1).unwrap();
            assert_eq!(versions.to_vec(), vec![0, 2]);
            assert_eq!(versions.size(), 2);
        }
    }

    #[test]
    fn test_constants_and_empty_junctions() {
        let catalog = catalog();
        let subsets = SubsetStore::new();

        let all = run(&catalog, &subsets, &query(Condition::and(vec![])), SetSelection::default());
        assert_eq!(all.len(), 3);

        let none = run(&catalog, &subsets, &query(Condition::or(vec![])), SetSelection::default());
        assert!(none.is_empty());

        let none = run(&catalog, &subsets, &query(Condition::constant(false)), SetSelection::default());
        assert!(none.is_empty());
    }

    #[test]
    fn test_subset_reference() {
        let catalog = catalog();
        let mut subsets = SubsetStore::new();
        subsets.update(Subset::new("s1", "Alpha", query(set_is("lea"))));

        let matches = run(&catalog, &subsets, &query(Condition::subset("s1")), SetSelection::default());
        assert_eq!(matches, RecordMatches::from([(0, 0), (1, 0)]));

        let missing = run(&catalog, &subsets, &query(Condition::subset("nope")), SetSelection::default());
        assert!(missing.is_empty());
    }

    #[test]
    fn test_reprint_is_any_later_version() {
        let catalog = catalog();
        let subsets = SubsetStore::new();
        let reprint = Condition::comparison(CompareOp::Eq, Prop::Reprint, Value::Bool(true));

        let matches = run(&catalog, &subsets, &query(reprint), SetSelection::default());
        assert_eq!(matches, RecordMatches::from([(1, 1)]));
    }

    #[test]
    fn test_error_names_record() {
        let catalog = catalog();
        let subsets = SubsetStore::new();
        let bad = query(Condition::substring(Prop::Cmc, "x"));

        let err = find_matching_records(&catalog, &subsets, &bad, SetSelection::default(), 1024).unwrap_err();
        assert_eq!(err.record(), Some("Black Lotus"));
    }

    #[test]
    fn test_length_unknown() {
        let catalog = Catalog::new();
        let subsets = SubsetStore::new();

        let err = find_matching_records(&catalog, &subsets, &Query::all(), SetSelection::default(), 1024)
            .unwrap_err();
        assert_eq!(err.code(), EvalErrorCode::LengthUnknown);
    }

    #[test]
    fn test_exhausted_arena_fails() {
        let catalog = catalog();
        let subsets = SubsetStore::new();
        let selection = SetSelection {
            small_set_optimization: false,
            bitset: true,
        };

        let err = find_matching_records(&catalog, &subsets, &query(cmc_is(2)), selection, 0).unwrap_err();
        assert_eq!(err.code(), EvalErrorCode::SetFailure);
    }
}

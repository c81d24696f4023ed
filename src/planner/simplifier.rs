//! Query simplification and combination
//!
//! Rewrite rules, applied bottom-up:
//!
//! - `not(not(c))` is `c`; `not` over a constant flips it
//! - `not` over a comparison or parity predicate flips the operator
//!   (`not(lt)` is `ge`, `not(even)` is `odd`); over anything else it stays
//! - nested `or`/`and` of the same kind are flattened
//! - `true` absorbs `or` and is dropped from `and`; `false` the reverse
//! - an empty `or` is `false`, an empty `and` is `true`, one child is the child
//!
//! Subset references are never inlined; they only contribute the subset's
//! properties to the query's required set.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::observability::{log_event, Event};
use crate::query::{Condition, ConditionRef, Prop, Query, Subset};

/// Subsets visible to the simplifier, keyed by id
pub type SubsetsById = HashMap<String, Arc<Subset>>;

/// Simplify a query's condition tree and complete its property set
pub fn simplify(id_to_subset: &SubsetsById, query: &Query) -> Query {
    Simplifier::new(id_to_subset, query.props.clone()).simplify(query)
}

/// AND several queries together.
///
/// A single query is returned unchanged; none at all matches everything.
pub fn combine_with_conjunction(id_to_subset: &SubsetsById, queries: &[Query]) -> Query {
    match queries {
        [] => Query::all(),
        [single] => single.clone(),
        _ => {
            let props: BTreeSet<Prop> = queries.iter().flat_map(|q| q.props.iter().copied()).collect();
            let conditions = queries.iter().map(|q| q.condition.clone()).collect();
            simplify(id_to_subset, &Query::new(props, Condition::and(conditions)))
        }
    }
}

struct Simplifier<'a> {
    id_to_subset: &'a SubsetsById,
    props: BTreeSet<Prop>,
}

impl<'a> Simplifier<'a> {
    fn new(id_to_subset: &'a SubsetsById, props: BTreeSet<Prop>) -> Self {
        Self {
            id_to_subset,
            props,
        }
    }

    fn simplify(mut self, query: &Query) -> Query {
        let condition = self.simplify_condition(&query.condition);
        Query::new(self.props, condition)
    }

    fn simplify_condition(&mut self, condition: &ConditionRef) -> ConditionRef {
        match &**condition {
            Condition::Not { condition: nested } => self.simplify_negation(nested),
            Condition::Or { conditions } => self.simplify_junction(conditions, false),
            Condition::And { conditions } => self.simplify_junction(conditions, true),
            Condition::Subset { id } => {
                match self.id_to_subset.get(id) {
                    Some(subset) => self.props.extend(subset.query.props.iter().copied()),
                    None => log_event(Event::SubsetMissing, &[("id", id)]),
                }
                condition.clone()
            }
            Condition::True | Condition::False => condition.clone(),
            leaf => {
                if let Some(prop) = leaf.prop() {
                    self.props.insert(prop);
                }
                condition.clone()
            }
        }
    }

    fn simplify_negation(&mut self, nested: &ConditionRef) -> ConditionRef {
        let nested = self.simplify_condition(nested);

        match &*nested {
            Condition::Not { condition } => condition.clone(),
            Condition::True => Condition::constant(false),
            Condition::False => Condition::constant(true),
            Condition::Comparison { op, prop, value } => {
                Condition::comparison(op.negate(), *prop, value.clone())
            }
            Condition::Predicate { op, prop } => Condition::predicate(op.negate(), *prop),
            _ => Condition::not(nested),
        }
    }

    /// `and` when `conjunction`, else `or`
    fn simplify_junction(&mut self, conditions: &[ConditionRef], conjunction: bool) -> ConditionRef {
        // The constant that decides the whole junction; its opposite is neutral.
        let absorbing = !conjunction;
        let mut flat = Vec::with_capacity(conditions.len());

        for nested in conditions {
            let nested = self.simplify_condition(nested);

            match &*nested {
                Condition::True | Condition::False => {
                    if matches!(&*nested, Condition::True) == absorbing {
                        return Condition::constant(absorbing);
                    }
                }
                Condition::And { conditions } if conjunction => {
                    flat.extend(conditions.iter().cloned())
                }
                Condition::Or { conditions } if !conjunction => {
                    flat.extend(conditions.iter().cloned())
                }
                _ => flat.push(nested),
            }
        }

        match flat.len() {
            0 => Condition::constant(!absorbing),
            1 => flat.swap_remove(0),
            _ if conjunction => Condition::and(flat),
            _ => Condition::or(flat),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{CompareOp, PredicateOp, Value};

    fn cmc(op: CompareOp, n: i32) -> ConditionRef {
        Condition::comparison(op, Prop::Cmc, Value::Int(n))
    }

    fn name(s: &str) -> ConditionRef {
        Condition::substring(Prop::NameInexact, s)
    }

    fn simplified(condition: ConditionRef) -> ConditionRef {
        simplify(&SubsetsById::new(), &Query::new(BTreeSet::new(), condition)).condition
    }

    #[test]
    fn test_double_negation() {
        assert_eq!(simplified(Condition::not(Condition::not(name("x")))), name("x"));
    }

    #[test]
    fn test_negation_of_constants() {
        assert_eq!(simplified(Condition::not(Condition::constant(true))), Condition::constant(false));
        assert_eq!(simplified(Condition::not(Condition::constant(false))), Condition::constant(true));
    }

    #[test]
    fn test_negation_flips_comparisons() {
        let cases = [
            (CompareOp::Eq, CompareOp::Ne),
            (CompareOp::Ne, CompareOp::Eq),
            (CompareOp::Lt, CompareOp::Ge),
            (CompareOp::Le, CompareOp::Gt),
            (CompareOp::Gt, CompareOp::Le),
            (CompareOp::Ge, CompareOp::Lt),
        ];

        for (op, negated) in cases {
            assert_eq!(simplified(Condition::not(cmc(op, 3))), cmc(negated, 3));
        }

        assert_eq!(
            simplified(Condition::not(Condition::predicate(PredicateOp::Even, Prop::Cmc))),
            Condition::predicate(PredicateOp::Odd, Prop::Cmc)
        );
    }

    #[test]
    fn test_negation_kept_over_other_nodes() {
        let sub = Condition::not(name("x"));
        assert_eq!(simplified(sub.clone()), sub);

        let or = Condition::not(Condition::or(vec![name("a"), name("b")]));
        assert_eq!(simplified(or.clone()), or);
    }

    #[test]
    fn test_negation_keeps_simplified_child() {
        let input = Condition::not(Condition::and(vec![name("x"), Condition::constant(true)]));
        assert_eq!(simplified(input), Condition::not(name("x")));
    }

    #[test]
    fn test_flatten_and_absorb() {
        let nested = Condition::and(vec![
            name("a"),
            Condition::and(vec![name("b"), Condition::constant(true)]),
            name("c"),
        ]);
        assert_eq!(simplified(nested), Condition::and(vec![name("a"), name("b"), name("c")]));

        let absorbed = Condition::or(vec![name("a"), Condition::constant(true)]);
        assert_eq!(simplified(absorbed), Condition::constant(true));

        let falsified = Condition::and(vec![name("a"), Condition::constant(false)]);
        assert_eq!(simplified(falsified), Condition::constant(false));
    }

    #[test]
    fn test_empty_and_single_children() {
        assert_eq!(simplified(Condition::or(vec![])), Condition::constant(false));
        assert_eq!(simplified(Condition::and(vec![])), Condition::constant(true));
        assert_eq!(
            simplified(Condition::or(vec![Condition::constant(false), name("a")])),
            name("a")
        );
    }

    #[test]
    fn test_or_does_not_flatten_and() {
        let input = Condition::or(vec![
            Condition::and(vec![name("a"), name("b")]),
            Condition::or(vec![name("c"), name("d")]),
        ]);
        assert_eq!(
            simplified(input),
            Condition::or(vec![
                Condition::and(vec![name("a"), name("b")]),
                name("c"),
                name("d"),
            ])
        );
    }

    #[test]
    fn test_idempotent() {
        let input = Condition::not(Condition::not(Condition::and(vec![
            Condition::or(vec![name("a"), Condition::constant(false)]),
            Condition::not(Condition::and(vec![cmc(CompareOp::Lt, 2), Condition::constant(true)])),
        ])));
        let once = simplified(input);
        assert_eq!(simplified(once.clone()), once);
    }

    #[test]
    fn test_collects_props() {
        let query = Query::new(
            BTreeSet::new(),
            Condition::and(vec![name("a"), cmc(CompareOp::Eq, 1)]),
        );
        let simplified = simplify(&SubsetsById::new(), &query);
        assert_eq!(
            simplified.props,
            [Prop::Cmc, Prop::NameInexact].into_iter().collect()
        );
    }

    #[test]
    fn test_subset_props_are_pulled_in() {
        let mut subsets = SubsetsById::new();
        let inner = Query::new([Prop::Rarity].into_iter().collect(), Condition::constant(true));
        subsets.insert("s1".into(), Arc::new(Subset::new("s1", "Simple", inner)));

        let query = Query::new(BTreeSet::new(), Condition::subset("s1"));
        let simplified = simplify(&subsets, &query);

        assert_eq!(simplified.condition, Condition::subset("s1"));
        assert!(simplified.props.contains(&Prop::Rarity));

        // Unknown ids are kept as-is.
        let missing = Query::new(BTreeSet::new(), Condition::subset("nope"));
        assert_eq!(simplify(&subsets, &missing).condition, Condition::subset("nope"));
    }

    #[test]
    fn test_combine() {
        let a = Query::new([Prop::Cmc].into_iter().collect(), cmc(CompareOp::Eq, 1));
        let b = Query::new([Prop::NameInexact].into_iter().collect(), name("x"));
        let combined = combine_with_conjunction(&SubsetsById::new(), &[a.clone(), b.clone()]);

        assert_eq!(combined.condition, Condition::and(vec![a.condition.clone(), b.condition]));
        assert_eq!(combined.props.len(), 2);

        assert_eq!(combine_with_conjunction(&SubsetsById::new(), &[a.clone()]), a);
        assert_eq!(combine_with_conjunction(&SubsetsById::new(), &[]), Query::all());
    }
}

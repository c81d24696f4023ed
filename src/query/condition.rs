//! Condition trees
//!
//! Trees are immutable once built. Children are reference-counted so one
//! subtree can be shared by several queries; rewriting a tree always builds new
//! nodes instead of mutating existing ones.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;

use super::mana::ManaCost;
use super::props::Prop;
use super::rarity::Rarity;

/// Shared handle to an immutable condition node
pub type ConditionRef = Arc<Condition>;

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl CompareOp {
    /// Operator matching exactly the complement
    pub fn negate(self) -> CompareOp {
        match self {
            CompareOp::Eq => CompareOp::Ne,
            CompareOp::Ne => CompareOp::Eq,
            CompareOp::Lt => CompareOp::Ge,
            CompareOp::Le => CompareOp::Gt,
            CompareOp::Gt => CompareOp::Le,
            CompareOp::Ge => CompareOp::Lt,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CompareOp::Eq => "eq",
            CompareOp::Ne => "ne",
            CompareOp::Lt => "lt",
            CompareOp::Gt => "gt",
            CompareOp::Le => "le",
            CompareOp::Ge => "ge",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PredicateOp {
    Even,
    Odd,
}

impl PredicateOp {
    pub fn negate(self) -> PredicateOp {
        match self {
            PredicateOp::Even => PredicateOp::Odd,
            PredicateOp::Odd => PredicateOp::Even,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PredicateOp::Even => "even",
            PredicateOp::Odd => "odd",
        }
    }
}

/// Literal a property is compared against
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    Bool(bool),
    Int(i32),
    Str(String),
    /// Milliseconds since the Unix epoch, UTC
    Date(i64),
    Cost(ManaCost),
    Rarity(Rarity),
}

/// One node of a query tree
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    True,
    False,
    Not {
        condition: ConditionRef,
    },
    Or {
        conditions: Vec<ConditionRef>,
    },
    And {
        conditions: Vec<ConditionRef>,
    },
    Comparison {
        op: CompareOp,
        prop: Prop,
        value: Value,
    },
    /// Containment in the pre-lowered text of a property
    Substring {
        prop: Prop,
        value: String,
    },
    Predicate {
        op: PredicateOp,
        prop: Prop,
    },
    /// Bounds are both `Int` or both `Date`
    Range {
        prop: Prop,
        start: Value,
        start_inc: bool,
        end: Value,
        end_inc: bool,
    },
    /// Reference to a stored subset, resolved by id at evaluation time
    Subset {
        id: String,
    },
}

impl Condition {
    pub fn constant(value: bool) -> ConditionRef {
        Arc::new(if value {
            Condition::True
        } else {
            Condition::False
        })
    }

    pub fn not(condition: ConditionRef) -> ConditionRef {
        Arc::new(Condition::Not { condition })
    }

    pub fn or(conditions: Vec<ConditionRef>) -> ConditionRef {
        Arc::new(Condition::Or { conditions })
    }

    pub fn and(conditions: Vec<ConditionRef>) -> ConditionRef {
        Arc::new(Condition::And { conditions })
    }

    pub fn comparison(op: CompareOp, prop: Prop, value: Value) -> ConditionRef {
        Arc::new(Condition::Comparison { op, prop, value })
    }

    pub fn substring(prop: Prop, value: impl Into<String>) -> ConditionRef {
        Arc::new(Condition::Substring {
            prop,
            value: value.into(),
        })
    }

    pub fn predicate(op: PredicateOp, prop: Prop) -> ConditionRef {
        Arc::new(Condition::Predicate { op, prop })
    }

    pub fn range(prop: Prop, start: Value, start_inc: bool, end: Value, end_inc: bool) -> ConditionRef {
        Arc::new(Condition::Range {
            prop,
            start,
            start_inc,
            end,
            end_inc,
        })
    }

    pub fn subset(id: impl Into<String>) -> ConditionRef {
        Arc::new(Condition::Subset { id: id.into() })
    }

    /// Property a leaf condition reads, `None` for structural nodes
    pub fn prop(&self) -> Option<Prop> {
        match self {
            Condition::Comparison { prop, .. }
            | Condition::Substring { prop, .. }
            | Condition::Predicate { prop, .. }
            | Condition::Range { prop, .. } => Some(*prop),
            _ => None,
        }
    }

    /// Short name of the node type, used in logs
    pub fn type_name(&self) -> &'static str {
        match self {
            Condition::True => "true",
            Condition::False => "false",
            Condition::Not { .. } => "not",
            Condition::Or { .. } => "or",
            Condition::And { .. } => "and",
            Condition::Comparison { op, .. } => op.as_str(),
            Condition::Substring { .. } => "substring",
            Condition::Predicate { op, .. } => op.as_str(),
            Condition::Range { .. } => "range",
            Condition::Subset { .. } => "subset",
        }
    }
}

/// Parsed query: a condition tree plus every property it needs loaded
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Query {
    pub props: BTreeSet<Prop>,
    pub condition: ConditionRef,
}

impl Query {
    pub fn new(props: BTreeSet<Prop>, condition: ConditionRef) -> Self {
        Self { props, condition }
    }

    /// Matches every record
    pub fn all() -> Self {
        Self::new(BTreeSet::new(), Condition::constant(true))
    }

    /// Matches nothing
    pub fn none() -> Self {
        Self::new(BTreeSet::new(), Condition::constant(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negate_is_involution() {
        for op in [
            CompareOp::Eq,
            CompareOp::Ne,
            CompareOp::Lt,
            CompareOp::Gt,
            CompareOp::Le,
            CompareOp::Ge,
        ] {
            assert_eq!(op.negate().negate(), op);
        }
        assert_eq!(PredicateOp::Even.negate(), PredicateOp::Odd);
    }

    #[test]
    fn test_structural_equality_ignores_sharing() {
        let shared = Condition::substring(Prop::NameInexact, "bolt");
        let a = Condition::and(vec![shared.clone(), shared.clone()]);
        let b = Condition::and(vec![
            Condition::substring(Prop::NameInexact, "bolt"),
            Condition::substring(Prop::NameInexact, "bolt"),
        ]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_prop_of_leaves() {
        let cond = Condition::predicate(PredicateOp::Odd, Prop::Cmc);
        assert_eq!(cond.prop(), Some(Prop::Cmc));
        assert_eq!(Condition::subset("x").prop(), None);
        assert_eq!(cond.type_name(), "odd");
    }

    #[test]
    fn test_serialize_shape() {
        let cond = Condition::comparison(CompareOp::Ge, Prop::Cmc, Value::Int(3));
        let json = serde_json::to_value(&*cond).unwrap();

        assert_eq!(json["type"], "comparison");
        assert_eq!(json["op"], "ge");
        assert_eq!(json["prop"], "cmc");
        assert_eq!(json["value"]["kind"], "int");
        assert_eq!(json["value"]["value"], 3);
    }
}

//! Leaf condition matching against property values

use std::cmp::Ordering;

use super::errors::{EvalError, EvalResult};
use crate::catalog::{Datum, Values};
use crate::query::{CompareOp, Condition, ManaCost, PredicateOp, Prop, Value, MANA_GENERIC};

/// Two costs are equal when they carry the same symbols in the same amounts
pub fn mana_cost_eq(a: &ManaCost, b: &ManaCost) -> bool {
    a.symbol_count() == b.symbol_count() && b.iter().all(|(symbol, count)| a.get(symbol) == Some(count))
}

/// Whether cost `a` contains cost `b`.
///
/// Every symbol of `b` must appear in `a` at least as often. A strict superset
/// additionally needs more total mana or more distinct symbols; a zero generic
/// cost (`{0}`) counts as a distinct symbol `a` lacks, so `{0} < {R}`.
pub fn is_super_set(a: &ManaCost, b: &ManaCost, strict: bool) -> bool {
    let mut a_symbols = a.symbol_count();
    let b_symbols = b.symbol_count();

    if a_symbols < b_symbols {
        return false;
    }

    let mut a_total = 0u64;
    let mut b_total = 0u64;

    for (symbol, b_count) in b.iter() {
        let a_count = a.get(symbol).unwrap_or(0);
        if a_count < b_count {
            return false;
        }
        a_total += u64::from(a_count);
        b_total += u64::from(b_count);
    }

    if !strict {
        return true;
    }

    if a_total > b_total {
        return true;
    }

    if b.get(MANA_GENERIC) == Some(0) && b_symbols == 1 && !a.contains(MANA_GENERIC) {
        a_symbols += 1;
    }

    a_symbols > b_symbols
}

/// Whether a leaf condition matches a property value.
///
/// For lists (faces or versions) `ne` matches only when no entry equals the
/// value; every other condition matches when any entry matches. Entries
/// without a value are skipped. A missing value behaves like an empty list.
pub fn matches_values(condition: &Condition, values: Values<'_>) -> EvalResult<bool> {
    match values {
        Values::One(datum) => matches_datum(condition, datum),
        list => {
            let sentinel = !matches!(condition, Condition::Comparison { op: CompareOp::Ne, .. });

            for i in 0..list.len() {
                let Some(datum) = list.get(i) else {
                    continue;
                };
                if matches_datum(condition, datum)? == sentinel {
                    return Ok(sentinel);
                }
            }
            Ok(!sentinel)
        }
    }
}

/// Whether a leaf condition matches one scalar value
pub fn matches_datum(condition: &Condition, datum: Datum<'_>) -> EvalResult<bool> {
    match condition {
        Condition::Predicate { op, .. } => match datum {
            Datum::Number(n) => {
                let even = n % 2.0 == 0.0;
                Ok(match op {
                    PredicateOp::Even => even,
                    PredicateOp::Odd => !even,
                })
            }
            other => Err(EvalError::type_mismatch(op.as_str(), other)),
        },

        Condition::Substring { value, .. } => match datum {
            Datum::Text(text) => Ok(text.contains(value.as_str())),
            other => Err(EvalError::type_mismatch("substring", other)),
        },

        Condition::Range {
            start,
            start_inc,
            end,
            end_inc,
            ..
        } => {
            let after_start = match order(datum, start, "range")? {
                Ordering::Greater => true,
                Ordering::Equal => *start_inc,
                Ordering::Less => false,
            };
            if !after_start {
                return Ok(false);
            }

            Ok(match order(datum, end, "range")? {
                Ordering::Less => true,
                Ordering::Equal => *end_inc,
                Ordering::Greater => false,
            })
        }

        Condition::Comparison { op, prop, value } => match (prop, datum) {
            (Prop::Colors | Prop::Cost | Prop::Identity, Datum::Cost(cost)) => {
                compare_cost(*op, *prop, cost, value)
            }
            _ => Ok(apply(*op, order(datum, value, op.as_str())?)),
        },

        other => Err(EvalError::type_mismatch(other.type_name(), datum)),
    }
}

fn compare_cost(op: CompareOp, prop: Prop, cost: &ManaCost, value: &Value) -> EvalResult<bool> {
    match value {
        // `c=2` counts colors rather than comparing costs
        Value::Int(n) if prop != Prop::Cost => {
            let count = cost.symbol_count() as i64;
            Ok(apply(op, count.cmp(&i64::from(*n))))
        }
        Value::Cost(query) => Ok(match op {
            CompareOp::Eq => mana_cost_eq(cost, query),
            CompareOp::Ne => !mana_cost_eq(cost, query),
            CompareOp::Gt => is_super_set(cost, query, true),
            CompareOp::Lt => is_super_set(query, cost, true),
            CompareOp::Ge => is_super_set(cost, query, false),
            CompareOp::Le => is_super_set(query, cost, false),
        }),
        other => Err(EvalError::type_mismatch(op.as_str(), other)),
    }
}

fn apply(op: CompareOp, ordering: Ordering) -> bool {
    match op {
        CompareOp::Eq => ordering == Ordering::Equal,
        CompareOp::Ne => ordering != Ordering::Equal,
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::Gt => ordering == Ordering::Greater,
        CompareOp::Le => ordering != Ordering::Greater,
        CompareOp::Ge => ordering != Ordering::Less,
    }
}

/// Order a property value against a literal of a compatible type
fn order(datum: Datum<'_>, value: &Value, condition: &str) -> EvalResult<Ordering> {
    let ordering = match (datum, value) {
        // NaN never appears in decoded columns; treat it as unordered-equal
        (Datum::Number(n), Value::Int(v)) => n.partial_cmp(&f64::from(*v)).unwrap_or(Ordering::Equal),
        (Datum::Date(d), Value::Date(v)) => d.cmp(v),
        (Datum::Rarity(r), Value::Rarity(v)) => r.rank().cmp(&v.rank()),
        (Datum::Text(t), Value::Str(v)) => t.cmp(v.as_str()),
        (Datum::Bool(b), Value::Bool(v)) => b.cmp(v),
        (datum, value) => {
            return Err(EvalError::type_mismatch(
                condition,
                format!("{:?} and {:?}", datum, value),
            ))
        }
    };
    Ok(ordering)
}

//! Canonical binary encoding of condition trees
//!
//! Layout (all integers little-endian):
//!
//! ```text
//! header:    u32 magic 0x5147544D | u16 version | u16 padding
//! condition: u8 tag | body
//! value:     u8 kind | body
//! ```
//!
//! Only the tree is encoded; the property set of a query is derived from the
//! tree and adds nothing.

use crate::query::{CompareOp, Condition, ManaCost, PredicateOp, Value};

pub const QUERY_HASH_MAGIC: u32 = 0x5147_544D;
pub const QUERY_HASH_VERSION: u16 = 1;

const TAG_TRUE: u8 = 1;
const TAG_FALSE: u8 = 2;
const TAG_NOT: u8 = 3;
const TAG_OR: u8 = 4;
const TAG_AND: u8 = 5;
const TAG_EQ: u8 = 6;
const TAG_NE: u8 = 7;
const TAG_LT: u8 = 8;
const TAG_GT: u8 = 9;
const TAG_LE: u8 = 10;
const TAG_GE: u8 = 11;
const TAG_SUBSTRING: u8 = 12;
const TAG_EVEN: u8 = 13;
const TAG_ODD: u8 = 14;
const TAG_RANGE: u8 = 15;
const TAG_SUBSET: u8 = 16;

const KIND_BOOL: u8 = 1;
const KIND_INT: u8 = 2;
const KIND_STR: u8 = 3;
const KIND_DATE: u8 = 4;
const KIND_COST: u8 = 5;

const RANGE_START_INC: u8 = 0x1;
const RANGE_END_INC: u8 = 0x2;

/// Encode a condition tree, header included
pub fn encode_condition(condition: &Condition) -> Vec<u8> {
    let mut encoder = QueryEncoder::new();
    encoder.condition(condition);
    encoder.finish()
}

/// Append-only writer for the canonical encoding
pub struct QueryEncoder {
    buf: Vec<u8>,
}

impl QueryEncoder {
    pub fn new() -> Self {
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(&QUERY_HASH_MAGIC.to_le_bytes());
        buf.extend_from_slice(&QUERY_HASH_VERSION.to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes());
        Self { buf }
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }

    pub fn condition(&mut self, condition: &Condition) {
        match condition {
            Condition::True => self.u8(TAG_TRUE),
            Condition::False => self.u8(TAG_FALSE),
            Condition::Not { condition } => {
                self.u8(TAG_NOT);
                self.condition(condition);
            }
            Condition::Or { conditions } | Condition::And { conditions } => {
                let tag = if matches!(condition, Condition::Or { .. }) {
                    TAG_OR
                } else {
                    TAG_AND
                };
                self.u8(tag);
                self.len(conditions.len());
                for child in conditions {
                    self.condition(child);
                }
            }
            Condition::Comparison { op, prop, value } => {
                self.u8(compare_tag(*op));
                self.u8(prop.code());
                self.value(value);
            }
            Condition::Substring { prop, value } => {
                self.u8(TAG_SUBSTRING);
                self.u8(prop.code());
                self.str(value);
            }
            Condition::Predicate { op, prop } => {
                self.u8(match op {
                    PredicateOp::Even => TAG_EVEN,
                    PredicateOp::Odd => TAG_ODD,
                });
                self.u8(prop.code());
            }
            Condition::Range {
                prop,
                start,
                start_inc,
                end,
                end_inc,
            } => {
                self.u8(TAG_RANGE);
                self.u8(prop.code());

                let mut flags = 0;
                if *start_inc {
                    flags |= RANGE_START_INC;
                }
                if *end_inc {
                    flags |= RANGE_END_INC;
                }
                self.u8(flags);

                self.value(start);
                self.value(end);
            }
            Condition::Subset { id } => {
                self.u8(TAG_SUBSET);
                self.str(id);
            }
        }
    }

    fn value(&mut self, value: &Value) {
        match value {
            Value::Bool(b) => {
                self.u8(KIND_BOOL);
                self.u8(u8::from(*b));
            }
            Value::Int(n) => {
                self.u8(KIND_INT);
                self.buf.extend_from_slice(&n.to_le_bytes());
            }
            Value::Str(s) => {
                self.u8(KIND_STR);
                self.str(s);
            }
            Value::Rarity(rarity) => {
                self.u8(KIND_STR);
                self.str(rarity.as_str());
            }
            Value::Date(ms) => {
                self.u8(KIND_DATE);
                self.buf.extend_from_slice(&(*ms as f64).to_le_bytes());
            }
            Value::Cost(cost) => {
                self.u8(KIND_COST);
                self.cost(cost);
            }
        }
    }

    /// Symbols come out of the cost in sorted key order
    fn cost(&mut self, cost: &ManaCost) {
        self.u8(u8::try_from(cost.symbol_count()).unwrap_or(u8::MAX));

        for (symbol, amount) in cost.iter() {
            self.buf.extend_from_slice(&symbol_mask(symbol).to_le_bytes());
            self.buf.extend_from_slice(&amount.to_le_bytes());
        }
    }

    fn str(&mut self, s: &str) {
        self.len(s.len());
        self.buf.extend_from_slice(s.as_bytes());
    }

    /// u16 length prefix, saturating
    fn len(&mut self, len: usize) {
        let len = u16::try_from(len).unwrap_or(u16::MAX);
        self.buf.extend_from_slice(&len.to_le_bytes());
    }

    fn u8(&mut self, byte: u8) {
        self.buf.push(byte);
    }
}

impl Default for QueryEncoder {
    fn default() -> Self {
        Self::new()
    }
}

fn compare_tag(op: CompareOp) -> u8 {
    match op {
        CompareOp::Eq => TAG_EQ,
        CompareOp::Ne => TAG_NE,
        CompareOp::Lt => TAG_LT,
        CompareOp::Gt => TAG_GT,
        CompareOp::Le => TAG_LE,
        CompareOp::Ge => TAG_GE,
    }
}

/// One bit per letter of a symbol key; digits count as generic
fn symbol_mask(symbol: &str) -> u16 {
    symbol.chars().fold(0, |mask, c| {
        mask | match c {
            'W' => 0x1,
            'U' => 0x2,
            'B' => 0x4,
            'R' => 0x8,
            'G' => 0x10,
            'C' => 0x20,
            'N' | '0'..='9' => 0x40,
            'X' => 0x80,
            'S' => 0x100,
            'P' => 0x200,
            _ => 0,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Prop, Rarity};

    #[test]
    fn test_header() {
        let bytes = encode_condition(&Condition::True);
        assert_eq!(bytes, vec![0x4D, 0x54, 0x47, 0x51, 1, 0, 0, 0, TAG_TRUE]);
    }

    #[test]
    fn test_symbol_masks() {
        assert_eq!(symbol_mask("W"), 0x1);
        assert_eq!(symbol_mask("W/U"), 0x3);
        assert_eq!(symbol_mask("2/W"), 0x41);
        assert_eq!(symbol_mask("G/W/P"), 0x211);
        assert_eq!(symbol_mask("N"), 0x40);
    }

    #[test]
    fn test_comparison_layout() {
        let condition = Condition::Comparison {
            op: CompareOp::Ge,
            prop: Prop::Cmc,
            value: Value::Int(3),
        };
        let bytes = encode_condition(&condition);

        assert_eq!(&bytes[8..], &[TAG_GE, Prop::Cmc.code(), KIND_INT, 3, 0, 0, 0]);
    }

    #[test]
    fn test_cost_layout() {
        let condition = Condition::Comparison {
            op: CompareOp::Eq,
            prop: Prop::Cost,
            value: Value::Cost(ManaCost::parse("{U}{2}")),
        };
        let bytes = encode_condition(&condition);

        // N sorts before U
        assert_eq!(
            &bytes[8..],
            &[TAG_EQ, Prop::Cost.code(), KIND_COST, 2, 0x40, 0, 2, 0, 0, 0, 0x2, 0, 1, 0, 0, 0]
        );
    }

    #[test]
    fn test_rarity_encodes_as_string() {
        let rarity = Condition::Comparison {
            op: CompareOp::Eq,
            prop: Prop::Rarity,
            value: Value::Rarity(Rarity::Rare),
        };
        let string = Condition::Comparison {
            op: CompareOp::Eq,
            prop: Prop::Rarity,
            value: Value::Str("rare".to_string()),
        };

        assert_eq!(encode_condition(&rarity), encode_condition(&string));
    }

    #[test]
    fn test_range_flags() {
        let range = |start_inc, end_inc| Condition::Range {
            prop: Prop::Cmc,
            start: Value::Int(1),
            start_inc,
            end: Value::Int(2),
            end_inc,
        };

        assert_eq!(encode_condition(&range(true, false))[10], RANGE_START_INC);
        assert_eq!(encode_condition(&range(false, true))[10], RANGE_END_INC);
        assert_ne!(
            encode_condition(&range(true, true)),
            encode_condition(&range(false, false))
        );
    }
}

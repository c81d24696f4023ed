//! Query data model
//!
//! A [`Query`] pairs an immutable [`Condition`] tree with the set of
//! properties the tree reads. Queries are produced by the parser, rewritten by
//! the planner and consumed by the evaluator and the query hash.

mod condition;
mod mana;
mod props;
mod rarity;
mod subset;

pub use condition::{CompareOp, Condition, ConditionRef, PredicateOp, Query, Value};
pub use mana::{
    parse_mana_cost, ManaCost, MANA_BLACK, MANA_BLUE, MANA_COLORLESS, MANA_GENERIC,
    MANA_GENERIC_X, MANA_GREEN, MANA_PHYREXIAN, MANA_RED, MANA_SNOW, MANA_WHITE, MANA_WUBRG,
};
pub use props::Prop;
pub use rarity::Rarity;
pub use subset::{Subset, SubsetStore};

/// Characters ignored when matching names inexactly
pub fn is_inexact_char(c: char) -> bool {
    matches!(c, '.' | ',' | ':' | ';' | '/' | '\\' | '\'' | '"' | ' ' | '\t')
}

/// Remove every inexact character
pub fn strip_inexact(s: &str) -> String {
    s.chars().filter(|&c| !is_inexact_char(c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_inexact() {
        assert_eq!(strip_inexact("t.a/\\,m'\":i;yoc"), "tamiyoc");
        assert_eq!(strip_inexact("Fire // Ice"), "FireIce");
    }
}

//! Predefined card pools
//!
//! A pool restricts every query to a fixed slice of the catalog. It is a
//! plain query, combined with the user's query by conjunction.

use std::fmt;

use crate::parser::{parse_query, SubsetsByName};
use crate::query::Query;

/// Cutoff between the pre-modern and modern frames
const MODERN_FRAME: &str = "2003-07-29";
/// Cutoff of the modern-frame pools
const M15_FRAME: &str = "2014-07-18";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardPool {
    All,
    /// Pre-modern commons
    Pmp,
    /// Pre-modern uncommon creatures
    Pmpc,
    /// Pre-modern staples: commons and uncommons minus the banned lands and Sol Ring
    Pmpst,
    /// Pre-modern rare creatures
    Pmpstc,
    /// Modern-frame commons
    Mp,
    /// Modern-frame uncommon creatures
    Mpc,
}

impl CardPool {
    pub const ALL: [CardPool; 7] = [
        CardPool::All,
        CardPool::Pmp,
        CardPool::Pmpc,
        CardPool::Pmpst,
        CardPool::Pmpstc,
        CardPool::Mp,
        CardPool::Mpc,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CardPool::All => "all",
            CardPool::Pmp => "pmp",
            CardPool::Pmpc => "pmpc",
            CardPool::Pmpst => "pmpst",
            CardPool::Pmpstc => "pmpstc",
            CardPool::Mp => "mp",
            CardPool::Mpc => "mpc",
        }
    }

    pub fn parse(name: &str) -> Option<CardPool> {
        CardPool::ALL.into_iter().find(|pool| pool.as_str() == name)
    }

    /// Query text of the pool
    pub fn query_text(self) -> String {
        match self {
            CardPool::All => String::new(),
            CardPool::Pmp => format!("date<{} rarity:common", MODERN_FRAME),
            CardPool::Pmpc => format!("date<{} rarity:uncommon type:creature", MODERN_FRAME),
            CardPool::Pmpst => format!(
                "date<{} rarity<=uncommon -\"Library of Alexandria\" -\"Strip Mine\" \
                 -\"Wasteland\" -\"Maze of Ith\" -\"Sol Ring\"",
                MODERN_FRAME
            ),
            CardPool::Pmpstc => format!("date<{} rarity:rare type:creature", MODERN_FRAME),
            CardPool::Mp => format!(
                "date>={} date<{} rarity:common -\"Rhystic Study\"",
                MODERN_FRAME, M15_FRAME
            ),
            CardPool::Mpc => format!(
                "date>={} date<{} rarity:uncommon type:creature",
                MODERN_FRAME, M15_FRAME
            ),
        }
    }

    /// Parsed pool query; pools never reference subsets
    pub fn query(self) -> Query {
        parse_query(&SubsetsByName::new(), &self.query_text())
    }
}

impl fmt::Display for CardPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

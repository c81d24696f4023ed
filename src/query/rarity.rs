//! Card rarity

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Mythic,
    Special,
    Bonus,
}

impl Rarity {
    /// Position in the comparison order: special sorts between rare and mythic
    pub fn rank(self) -> u8 {
        match self {
            Rarity::Common => 0,
            Rarity::Uncommon => 1,
            Rarity::Rare => 2,
            Rarity::Special => 3,
            Rarity::Mythic => 4,
            Rarity::Bonus => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Uncommon => "uncommon",
            Rarity::Rare => "rare",
            Rarity::Mythic => "mythic",
            Rarity::Special => "special",
            Rarity::Bonus => "bonus",
        }
    }

    /// Accepts the full lower-case name or its first letter
    pub fn parse(word: &str) -> Option<Rarity> {
        match word {
            "c" | "common" => Some(Rarity::Common),
            "u" | "uncommon" => Some(Rarity::Uncommon),
            "r" | "rare" => Some(Rarity::Rare),
            "m" | "mythic" => Some(Rarity::Mythic),
            "s" | "special" => Some(Rarity::Special),
            "b" | "bonus" => Some(Rarity::Bonus),
            _ => None,
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

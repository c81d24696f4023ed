//! Card properties

use std::fmt;

use serde::{Deserialize, Serialize};

/// Queryable card property.
///
/// Declaration order is significant: it is the canonical order of required
/// property sets and determines the one-byte code used by the query hash.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Prop {
    Colors,
    Formats,
    Identity,
    Img,
    Cost,
    Cmc,
    Landscape,
    Name,
    NameSearch,
    NameInexact,
    Oracle,
    OracleSearch,
    FullOracle,
    FullOracleSearch,
    Rarity,
    ReleasedAt,
    Reprint,
    Set,
    Sfurl,
    Type,
    TypeSearch,
}

impl Prop {
    /// Every property, in canonical order
    pub const ALL: [Prop; 21] = [
        Prop::Colors,
        Prop::Formats,
        Prop::Identity,
        Prop::Img,
        Prop::Cost,
        Prop::Cmc,
        Prop::Landscape,
        Prop::Name,
        Prop::NameSearch,
        Prop::NameInexact,
        Prop::Oracle,
        Prop::OracleSearch,
        Prop::FullOracle,
        Prop::FullOracleSearch,
        Prop::Rarity,
        Prop::ReleasedAt,
        Prop::Reprint,
        Prop::Set,
        Prop::Sfurl,
        Prop::Type,
        Prop::TypeSearch,
    ];

    /// Properties holding one value per printed version
    pub const PER_VERSION: [Prop; 4] = [Prop::Rarity, Prop::ReleasedAt, Prop::Reprint, Prop::Set];

    pub fn is_per_version(self) -> bool {
        matches!(
            self,
            Prop::Rarity | Prop::ReleasedAt | Prop::Reprint | Prop::Set
        )
    }

    /// One-based code used by the canonical query encoding
    pub fn code(self) -> u8 {
        self as u8 + 1
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Prop::Colors => "colors",
            Prop::Formats => "formats",
            Prop::Identity => "identity",
            Prop::Img => "img",
            Prop::Cost => "cost",
            Prop::Cmc => "cmc",
            Prop::Landscape => "landscape",
            Prop::Name => "name",
            Prop::NameSearch => "name_search",
            Prop::NameInexact => "name_inexact",
            Prop::Oracle => "oracle",
            Prop::OracleSearch => "oracle_search",
            Prop::FullOracle => "full_oracle",
            Prop::FullOracleSearch => "full_oracle_search",
            Prop::Rarity => "rarity",
            Prop::ReleasedAt => "released_at",
            Prop::Reprint => "reprint",
            Prop::Set => "set",
            Prop::Sfurl => "sfurl",
            Prop::Type => "type",
            Prop::TypeSearch => "type_search",
        }
    }

    pub fn parse(name: &str) -> Option<Prop> {
        Prop::ALL.into_iter().find(|p| p.as_str() == name)
    }

    /// Stored property a derived property is computed from.
    ///
    /// `reprint` is logical and has no payload of its own; it maps to itself.
    pub fn source(self) -> Prop {
        match self {
            Prop::NameSearch | Prop::NameInexact => Prop::Name,
            Prop::Oracle | Prop::OracleSearch | Prop::FullOracleSearch => Prop::FullOracle,
            Prop::TypeSearch => Prop::Type,
            other => other,
        }
    }
}

impl fmt::Display for Prop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_follow_declaration_order() {
        for (i, prop) in Prop::ALL.iter().enumerate() {
            assert_eq!(prop.code() as usize, i + 1);
        }
        assert_eq!(Prop::Colors.code(), 1);
        assert_eq!(Prop::TypeSearch.code(), 21);
    }

    #[test]
    fn test_per_version() {
        for prop in Prop::ALL {
            assert_eq!(prop.is_per_version(), Prop::PER_VERSION.contains(&prop));
        }
    }

    #[test]
    fn test_parse_round_trips_names() {
        assert_eq!(Prop::parse("full_oracle_search"), Some(Prop::FullOracleSearch));
        assert_eq!(Prop::parse("released_at"), Some(Prop::ReleasedAt));
        assert_eq!(Prop::parse("power"), None);
    }

    #[test]
    fn test_source() {
        assert_eq!(Prop::NameInexact.source(), Prop::Name);
        assert_eq!(Prop::OracleSearch.source(), Prop::FullOracle);
        assert_eq!(Prop::TypeSearch.source(), Prop::Type);
        assert_eq!(Prop::Reprint.source(), Prop::Reprint);
        assert_eq!(Prop::Cmc.source(), Prop::Cmc);
    }
}

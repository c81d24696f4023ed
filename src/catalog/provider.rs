//! Read interface between catalog data and the evaluator

use crate::query::{ManaCost, Prop, Rarity};

/// One scalar property value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Datum<'a> {
    Bool(bool),
    Number(f64),
    Text(&'a str),
    /// Epoch milliseconds, UTC
    Date(i64),
    Cost(&'a ManaCost),
    Rarity(Rarity),
}

/// Property value of one record, possibly one entry per face or per version
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Values<'a> {
    Missing,
    One(Datum<'a>),
    Texts(&'a [String]),
    /// Faces without a cost are `None`
    Costs(&'a [Option<ManaCost>]),
    Rarities(&'a [Rarity]),
    Dates(&'a [i64]),
}

impl<'a> Values<'a> {
    /// Whether this is a list of values rather than a single one
    pub fn is_list(&self) -> bool {
        !matches!(self, Values::Missing | Values::One(_))
    }

    /// Number of entries; 0 for `Missing`, 1 for `One`
    pub fn len(&self) -> usize {
        match self {
            Values::Missing => 0,
            Values::One(_) => 1,
            Values::Texts(values) => values.len(),
            Values::Costs(values) => values.len(),
            Values::Rarities(values) => values.len(),
            Values::Dates(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entry `idx`; `None` when out of range or when that entry has no value
    pub fn get(&self, idx: usize) -> Option<Datum<'a>> {
        match *self {
            Values::Missing => None,
            Values::One(datum) => (idx == 0).then_some(datum),
            Values::Texts(values) => values.get(idx).map(|v| Datum::Text(v.as_str())),
            Values::Costs(values) => values.get(idx)?.as_ref().map(Datum::Cost),
            Values::Rarities(values) => values.get(idx).map(|&r| Datum::Rarity(r)),
            Values::Dates(values) => values.get(idx).map(|&d| Datum::Date(d)),
        }
    }
}

/// Columnar read access to the loaded catalog.
///
/// Per-version properties hold one value per printed version of a record;
/// card-level properties hold one value, or one per face.
pub trait CardDataProvider {
    /// Number of records, known once any property is loaded
    fn length(&self) -> Option<usize>;

    /// Number of versions of a record, known once any per-version property is loaded
    fn version_count(&self, idx: usize) -> Option<usize>;

    /// Whole value of a property; the full version list for per-version properties
    fn get(&self, idx: usize, prop: Prop) -> Values<'_>;

    /// Value of a property for one version.
    ///
    /// Card-level properties return the same value for every version.
    fn get_for_version(&self, idx: usize, version: usize, prop: Prop) -> Values<'_> {
        if prop == Prop::Reprint {
            return Values::One(Datum::Bool(version != 0));
        }

        let values = self.get(idx, prop);

        if prop.is_per_version() {
            values.get(version).map_or(Values::Missing, Values::One)
        } else {
            values
        }
    }

    /// Display name, faces joined with `" // "`
    fn name(&self, idx: usize) -> Option<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_access() {
        let names = vec!["fire".to_string(), "ice".to_string()];
        let texts = Values::Texts(&names);

        assert!(texts.is_list());
        assert_eq!(texts.len(), 2);
        assert_eq!(texts.get(1), Some(Datum::Text("ice")));
        assert_eq!(texts.get(2), None);

        let one = Values::One(Datum::Number(3.0));
        assert!(!one.is_list());
        assert_eq!(one.get(0), Some(Datum::Number(3.0)));
        assert_eq!(one.get(1), None);

        assert!(Values::Missing.is_empty());
    }

    #[test]
    fn test_costs_skip_missing_faces() {
        let costs = vec![Some(ManaCost::parse("{R}")), None];
        let values = Values::Costs(&costs);

        assert!(matches!(values.get(0), Some(Datum::Cost(_))));
        assert_eq!(values.get(1), None);
    }
}

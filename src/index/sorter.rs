//! Result ordering

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::{IndexError, IndexResult};
use super::sort_index::SortIndex;

/// Order in which results are returned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Cmc,
    #[default]
    Name,
    ReleasedAt,
}

impl SortOrder {
    pub const ALL: [SortOrder; 3] = [SortOrder::Cmc, SortOrder::Name, SortOrder::ReleasedAt];

    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Cmc => "cmc",
            SortOrder::Name => "name",
            SortOrder::ReleasedAt => "released_at",
        }
    }

    pub fn parse(s: &str) -> Option<SortOrder> {
        SortOrder::ALL.into_iter().find(|o| o.as_str() == s)
    }

    /// Name of the index file for this order; `None` for the dataset order
    pub fn file_name(self) -> Option<String> {
        match self {
            SortOrder::Name => None,
            other => Some(format!("card_{}.sort", other.as_str())),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Orders a record -> version match map
#[derive(Debug, Clone)]
pub enum Sorter {
    /// Dataset order, which is sorted by name
    Name,
    Index(SortIndex),
}

impl Sorter {
    /// Wrap a decoded index, checking that it was built for `order`
    pub fn from_index(order: SortOrder, index: SortIndex) -> IndexResult<Self> {
        if index.order() != order.as_str() {
            return Err(IndexError::order_mismatch(order.as_str(), index.order()));
        }
        Ok(Sorter::Index(index))
    }

    pub fn order(&self) -> Option<SortOrder> {
        match self {
            Sorter::Name => Some(SortOrder::Name),
            Sorter::Index(index) => SortOrder::parse(index.order()),
        }
    }

    /// Creation time of the snapshot the sorter belongs to, if it has one
    pub fn creation_time(&self) -> Option<u64> {
        match self {
            Sorter::Name => None,
            Sorter::Index(index) => Some(index.creation_time()),
        }
    }

    /// Matched record indices in result order; `len` is the dataset length
    pub fn sort(&self, matches: &HashMap<usize, usize>, len: usize, ascending: bool) -> Vec<usize> {
        match self {
            Sorter::Name => {
                let records = 0..len;
                let ordered: Box<dyn Iterator<Item = usize>> = if ascending {
                    Box::new(records)
                } else {
                    Box::new(records.rev())
                };
                ordered.filter(|idx| matches.contains_key(idx)).collect()
            }
            Sorter::Index(index) => index.sort(matches, len, ascending),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::errors::IndexErrorCode;
    use crate::index::sort_index::SortIndexKind;
    use crate::index::writer::SortIndexWriter;

    #[test]
    fn test_sort_order_names() {
        for order in SortOrder::ALL {
            assert_eq!(SortOrder::parse(order.as_str()), Some(order));
        }
        assert_eq!(SortOrder::parse("price"), None);
        assert_eq!(SortOrder::Name.file_name(), None);
        assert_eq!(SortOrder::Cmc.file_name().as_deref(), Some("card_cmc.sort"));
        assert_eq!(SortOrder::default(), SortOrder::Name);
    }

    #[test]
    fn test_name_sorter() {
        let matches: HashMap<usize, usize> = [(1, 0), (3, 2), (4, 0)].into_iter().collect();

        assert_eq!(Sorter::Name.sort(&matches, 5, true), vec![1, 3, 4]);
        assert_eq!(Sorter::Name.sort(&matches, 5, false), vec![4, 3, 1]);
        assert_eq!(Sorter::Name.sort(&matches, 4, true), vec![1, 3]);
    }

    #[test]
    fn test_index_order_must_match() {
        let mut writer = SortIndexWriter::new("cmc", SortIndexKind::ByRecord, 1);
        writer.push(0, 0, 0);
        let index = SortIndex::decode(writer.finish()).unwrap();

        let err = Sorter::from_index(SortOrder::ReleasedAt, index.clone()).unwrap_err();
        assert_eq!(err.code(), IndexErrorCode::OrderMismatch);

        let sorter = Sorter::from_index(SortOrder::Cmc, index).unwrap();
        assert_eq!(sorter.order(), Some(SortOrder::Cmc));
        assert_eq!(sorter.creation_time(), Some(1));
    }
}

//! Sort-index determinism tests
//!
//! Tests:
//! - Writing the same entries always yields the same bytes
//! - Decoding what the writer produced preserves header and entries
//! - Sorting is deterministic and direction only reverses group order
//! - Out-of-range records are skipped rather than read
//! - Per-version indices place a record by its matched version

use std::collections::HashMap;

use cardquery::index::{
    IndexErrorCode, SortIndex, SortIndexKind, SortIndexWriter, SortOrder, Sorter,
};

// =============================================================================
// Helper Functions
// =============================================================================

/// (key, record, version) entries in dataset order
const ENTRIES: [(i64, u16, u16); 7] = [
    (3, 0, 0),
    (1, 1, 0),
    (3, 2, 0),
    (0, 3, 0),
    (1, 3, 1),
    (7, 4, 0),
    (0, 4, 1),
];

fn build(kind: SortIndexKind, entries: &[(i64, u16, u16)]) -> Vec<u8> {
    let mut writer = SortIndexWriter::new("released_at", kind, 42);
    for &(key, record, version) in entries {
        writer.push(key, record, version);
    }
    writer.finish()
}

fn all_matched(records: &[usize]) -> HashMap<usize, usize> {
    records.iter().map(|&r| (r, 0)).collect()
}

// =============================================================================
// Writer determinism
// =============================================================================

/// Identical input produces identical bytes
#[test]
fn test_writer_is_deterministic() {
    let a = build(SortIndexKind::ByVersion, &ENTRIES);
    let b = build(SortIndexKind::ByVersion, &ENTRIES);
    assert_eq!(a, b);
}

/// Header fields survive a decode
#[test]
fn test_decode_reads_header() {
    let index = SortIndex::decode(build(SortIndexKind::ByVersion, &ENTRIES)).unwrap();

    assert_eq!(index.kind(), SortIndexKind::ByVersion);
    assert_eq!(index.creation_time(), 42);
    assert_eq!(index.order(), "released_at");
    assert_eq!(index.group_count(), 4);
    assert_eq!(index.entry_count(), ENTRIES.len());
}

/// Entries are grouped by ascending key and keep push order inside a group
#[test]
fn test_entries_grouped_by_key() {
    let index = SortIndex::decode(build(SortIndexKind::ByVersion, &ENTRIES)).unwrap();
    let entries: Vec<(usize, usize)> = (0..index.entry_count()).map(|i| index.entry(i)).collect();

    assert_eq!(
        entries,
        [(3, 0), (4, 1), (1, 0), (3, 1), (0, 0), (2, 0), (4, 0)]
    );
}

// =============================================================================
// Sorting
// =============================================================================

/// Repeated sorts of the same matches agree
#[test]
fn test_sort_is_deterministic() {
    let index = SortIndex::decode(build(SortIndexKind::ByRecord, &ENTRIES[..4])).unwrap();
    let matches = all_matched(&[0, 1, 2, 3]);

    let first = index.sort(&matches, 5, true);
    for _ in 0..10 {
        assert_eq!(index.sort(&matches, 5, true), first);
    }
    assert_eq!(first, [3, 1, 0, 2]);
}

/// Descending reverses groups; ties stay in dataset order
#[test]
fn test_descending_reverses_groups_only() {
    let index = SortIndex::decode(build(SortIndexKind::ByRecord, &ENTRIES[..4])).unwrap();
    let matches = all_matched(&[0, 1, 2, 3]);

    assert_eq!(index.sort(&matches, 5, false), [0, 2, 1, 3]);
}

/// Records past the dataset length are skipped
#[test]
fn test_out_of_range_records_skipped() {
    let index = SortIndex::decode(build(SortIndexKind::ByRecord, &ENTRIES[..4])).unwrap();
    let matches = all_matched(&[0, 1, 2, 3]);

    assert_eq!(index.sort(&matches, 2, true), [1, 0]);
}

/// A per-version index places each record at its matched version only
#[test]
fn test_per_version_uses_matched_version() {
    let index = SortIndex::decode(build(SortIndexKind::ByVersion, &ENTRIES)).unwrap();

    // Record 3 matched on version 1 (key 1), record 4 on version 0 (key 7)
    let matches: HashMap<usize, usize> = [(3, 1), (4, 0), (0, 0)].into();

    assert_eq!(index.sort(&matches, 5, true), [3, 0, 4]);
    assert_eq!(index.sort(&matches, 5, false), [4, 0, 3]);
}

/// Name order is the dataset order, in either direction
#[test]
fn test_name_sorter() {
    let matches = all_matched(&[4, 1, 2]);

    assert_eq!(Sorter::Name.sort(&matches, 5, true), [1, 2, 4]);
    assert_eq!(Sorter::Name.sort(&matches, 5, false), [4, 2, 1]);
}

// =============================================================================
// Validation
// =============================================================================

/// Every truncation of a valid index is rejected
#[test]
fn test_every_truncation_rejected() {
    let bytes = build(SortIndexKind::ByVersion, &ENTRIES);

    for len in 0..bytes.len() {
        let err = SortIndex::decode(bytes[..len].to_vec()).unwrap_err();
        assert_eq!(err.code(), IndexErrorCode::Truncated, "length {}", len);
    }
}

/// A sorter is only built from an index for the requested order
#[test]
fn test_sorter_checks_order() {
    let index = SortIndex::decode(build(SortIndexKind::ByVersion, &ENTRIES)).unwrap();
    let err = Sorter::from_index(SortOrder::Cmc, index.clone()).unwrap_err();
    assert_eq!(err.code(), IndexErrorCode::OrderMismatch);

    let sorter = Sorter::from_index(SortOrder::ReleasedAt, index).unwrap();
    assert_eq!(sorter.order(), Some(SortOrder::ReleasedAt));
    assert_eq!(sorter.creation_time(), Some(42));
}

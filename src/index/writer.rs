//! Sort-index writer
//!
//! Builds the binary format read by [`SortIndex`](super::SortIndex). Entries
//! must be pushed in dataset order; they are grouped by key in ascending key
//! order and keep their push order inside a group.

use std::collections::BTreeMap;

use super::sort_index::{
    SortIndexKind, GROUP_TABLE_OFFSET, SORT_INDEX_MAGIC, SORT_INDEX_VERSION, SORT_KEY_LEN,
};

pub struct SortIndexWriter {
    order: String,
    kind: SortIndexKind,
    creation_time: u64,
    groups: BTreeMap<i64, Vec<(u16, u16)>>,
}

impl SortIndexWriter {
    /// `order` is truncated to 16 bytes
    pub fn new(order: &str, kind: SortIndexKind, creation_time: u64) -> Self {
        Self {
            order: order.to_string(),
            kind,
            creation_time,
            groups: BTreeMap::new(),
        }
    }

    /// Add an entry; `version` is ignored by per-record indices
    pub fn push(&mut self, key: i64, record: u16, version: u16) {
        self.groups.entry(key).or_default().push((record, version));
    }

    pub fn finish(self) -> Vec<u8> {
        let entry_count: usize = self.groups.values().map(Vec::len).sum();
        let mut buf = Vec::with_capacity(
            GROUP_TABLE_OFFSET + 4 * self.groups.len() + self.kind.entry_size() * entry_count,
        );

        buf.extend_from_slice(SORT_INDEX_MAGIC);
        buf.extend_from_slice(&SORT_INDEX_VERSION.to_le_bytes());
        buf.push(self.kind as u8);
        buf.push(0);
        buf.extend_from_slice(&self.creation_time.to_le_bytes());

        let mut key = [0u8; SORT_KEY_LEN];
        let name = self.order.as_bytes();
        let name_len = name.len().min(SORT_KEY_LEN);
        key[..name_len].copy_from_slice(&name[..name_len]);
        buf.extend_from_slice(&key);

        buf.extend_from_slice(&(self.groups.len() as u32).to_le_bytes());

        let mut end = 0u32;
        for entries in self.groups.values() {
            end += entries.len() as u32;
            buf.extend_from_slice(&end.to_le_bytes());
        }

        for entries in self.groups.values() {
            for &(record, version) in entries {
                buf.extend_from_slice(&record.to_le_bytes());

                if self.kind == SortIndexKind::ByVersion {
                    buf.extend_from_slice(&version.to_le_bytes());
                }
            }
        }

        buf
    }
}

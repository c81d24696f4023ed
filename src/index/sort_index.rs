//! Binary sort-index decoder
//!
//! Layout (little endian):
//!
//! ```text
//! 0   magic "MTGI"
//! 4   u16 format version (3)
//! 6   u8  kind (1 = per record, 2 = per version)
//! 7   u8  reserved
//! 8   u64 snapshot creation time, epoch ms
//! 16  [u8; 16] sort key, zero padded
//! 32  u32 group count G
//! 36  G x u32 cumulative group end offsets
//! ..  N entries: u16 record (kind 1) or u16 record + u16 version (kind 2)
//! ```
//!
//! Groups hold records with equal sort values. Entries inside a group keep the
//! dataset's canonical order, so reversing the direction only reverses the
//! order of groups.

use std::collections::HashMap;

use super::errors::{IndexError, IndexResult};
use crate::observability::{log_event, Event};

pub const SORT_INDEX_MAGIC: &[u8; 4] = b"MTGI";
pub const SORT_INDEX_VERSION: u16 = 3;
pub const SORT_KEY_OFFSET: usize = 16;
pub const SORT_KEY_LEN: usize = 16;
pub const GROUP_COUNT_OFFSET: usize = 32;
pub const GROUP_TABLE_OFFSET: usize = GROUP_COUNT_OFFSET + 4;

/// What one entry identifies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortIndexKind {
    /// Entry is a record; any matching version qualifies
    ByRecord = 1,
    /// Entry is a (record, version) pair; only the record's chosen version qualifies
    ByVersion = 2,
}

impl SortIndexKind {
    pub fn from_u8(kind: u8) -> IndexResult<Self> {
        match kind {
            1 => Ok(SortIndexKind::ByRecord),
            2 => Ok(SortIndexKind::ByVersion),
            other => Err(IndexError::bad_kind(other)),
        }
    }

    /// Entry width in bytes
    pub fn entry_size(self) -> usize {
        2 * self as usize
    }
}

/// Validated, decoded sort index over an owned buffer
#[derive(Debug, Clone)]
pub struct SortIndex {
    buf: Vec<u8>,
    kind: SortIndexKind,
    creation_time: u64,
    order: String,
    group_count: usize,
    entries_offset: usize,
}

impl SortIndex {
    /// Decode and validate a buffer.
    ///
    /// Every table is bounds-checked here so that `sort` can't read past the
    /// end of the buffer.
    pub fn decode(buf: Vec<u8>) -> IndexResult<Self> {
        let len = buf.len();

        if len < GROUP_TABLE_OFFSET {
            return Err(IndexError::truncated(0, GROUP_TABLE_OFFSET, len));
        }

        if &buf[0..4] != SORT_INDEX_MAGIC {
            return Err(IndexError::bad_magic(&buf[0..4]));
        }

        let version = read_u16(&buf, 4);
        if version != SORT_INDEX_VERSION {
            return Err(IndexError::unsupported_version(version, SORT_INDEX_VERSION));
        }

        let kind = SortIndexKind::from_u8(buf[6])?;
        let creation_time = read_u64(&buf, 8);

        let key = &buf[SORT_KEY_OFFSET..SORT_KEY_OFFSET + SORT_KEY_LEN];
        let key_len = key.iter().position(|&b| b == 0).unwrap_or(SORT_KEY_LEN);
        let order = std::str::from_utf8(&key[..key_len])
            .map_err(|_| IndexError::corrupt(SORT_KEY_OFFSET, "sort key is not UTF-8"))?
            .to_string();

        let group_count = read_u32(&buf, GROUP_COUNT_OFFSET) as usize;
        let entries_offset = GROUP_TABLE_OFFSET + 4 * group_count;

        if entries_offset > len {
            return Err(IndexError::truncated(
                GROUP_TABLE_OFFSET,
                4 * group_count,
                len,
            ));
        }

        let mut previous_end = 0;
        for group in 0..group_count {
            let offset = GROUP_TABLE_OFFSET + 4 * group;
            let end = read_u32(&buf, offset) as usize;

            if end < previous_end {
                return Err(IndexError::corrupt(offset, "group ends decrease"));
            }
            previous_end = end;
        }

        let entries_len = previous_end * kind.entry_size();
        if entries_offset + entries_len > len {
            return Err(IndexError::truncated(entries_offset, entries_len, len));
        }

        Ok(Self {
            buf,
            kind,
            creation_time,
            order,
            group_count,
            entries_offset,
        })
    }

    pub fn kind(&self) -> SortIndexKind {
        self.kind
    }

    /// Snapshot creation time in epoch milliseconds
    pub fn creation_time(&self) -> u64 {
        self.creation_time
    }

    /// Name of the sort key the index was built for
    pub fn order(&self) -> &str {
        &self.order
    }

    pub fn group_count(&self) -> usize {
        self.group_count
    }

    /// Total number of entries
    pub fn entry_count(&self) -> usize {
        self.group_end(self.group_count)
    }

    /// Entry range of one group, `group < group_count`
    fn group_range(&self, group: usize) -> std::ops::Range<usize> {
        self.group_end(group)..self.group_end(group + 1)
    }

    /// End offset of group `group - 1`; 0 for the first group
    fn group_end(&self, group: usize) -> usize {
        if group == 0 {
            0
        } else {
            read_u32(&self.buf, GROUP_TABLE_OFFSET + 4 * (group - 1)) as usize
        }
    }

    /// Record and version of entry `idx`; version is 0 for per-record indices
    pub fn entry(&self, idx: usize) -> (usize, usize) {
        let offset = self.entries_offset + self.kind.entry_size() * idx;
        let record = read_u16(&self.buf, offset) as usize;

        match self.kind {
            SortIndexKind::ByRecord => (record, 0),
            SortIndexKind::ByVersion => (record, read_u16(&self.buf, offset + 2) as usize),
        }
    }

    /// Order the matched records.
    ///
    /// `matches` maps record index to the chosen version index. Entries whose
    /// record index is `>= len` are skipped and reported in one log line.
    pub fn sort(&self, matches: &HashMap<usize, usize>, len: usize, ascending: bool) -> Vec<usize> {
        let mut result = Vec::with_capacity(matches.len());
        let mut invalid = 0usize;

        for i in 0..self.group_count {
            let group = if ascending { i } else { self.group_count - 1 - i };

            for j in self.group_range(group) {
                let (record, version) = self.entry(j);

                if record >= len {
                    invalid += 1;
                    continue;
                }

                let included = match self.kind {
                    SortIndexKind::ByRecord => matches.contains_key(&record),
                    SortIndexKind::ByVersion => matches.get(&record) == Some(&version),
                };

                if included {
                    result.push(record);
                }
            }
        }

        if invalid > 0 {
            let count = invalid.to_string();
            log_event(
                Event::SortIndexInvalidEntries,
                &[("order", &self.order), ("count", &count)],
            );
        }

        result
    }
}

fn read_u16(buf: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([buf[offset], buf[offset + 1]])
}

fn read_u32(buf: &[u8], offset: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&buf[offset..offset + 4]);
    u32::from_le_bytes(bytes)
}

fn read_u64(buf: &[u8], offset: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[offset..offset + 8]);
    u64::from_le_bytes(bytes)
}

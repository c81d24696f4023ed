//! Fixed-capacity sets of small unsigned integers
//!
//! The evaluator tracks "versions of a record that still match" with one of
//! three interchangeable implementations sharing the [`UintSet`] contract:
//!
//! - [`Bitset32`]: capacity ≤ 32, the whole set is one inline word
//! - [`Bitset`]: capacity ≤ 1024, words bump-allocated from a [`BitsetArena`]
//! - [`ArraySet`]: capacity ≤ 1024, sorted `u16` values in an [`ArraySetArena`]
//!
//! # Arenas
//!
//! Arena-backed sets are handles into memory owned by the arena, so every
//! operation takes the arena explicitly. An arena is reset once per evaluated
//! record; handles created before a reset are dead afterwards. Debug builds
//! stamp each handle with the arena generation and assert on it.
//!
//! Allocation happens only inside one synchronous evaluation, never across an
//! await point, and temporaries are released in reverse allocation order by the
//! next reset.

mod array_set;
mod bitset;
mod bitset32;
mod errors;

pub use array_set::{ArraySet, ArraySetArena};
pub use bitset::{Bitset, BitsetArena};
pub use bitset32::Bitset32;
pub use errors::{UintSetError, UintSetErrorCode, UintSetResult};

/// Largest capacity any implementation supports
pub const MAX_CAPACITY: usize = 1024;

/// Default size of each evaluation arena in bytes
pub const DEFAULT_ARENA_BYTES: usize = 256 * 1024;

/// Shared contract of all integer-set implementations.
///
/// Values live in `[0, cap)`; `size()` is kept exact after every operation.
/// Binary operations require both operands to have the same capacity.
pub trait UintSet: Sized {
    /// Backing memory; `()` for inline sets
    type Arena;

    /// Create an empty set
    fn with_cap(arena: &mut Self::Arena, cap: usize) -> UintSetResult<Self>;

    fn cap(&self) -> usize;

    fn size(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    fn has(&self, arena: &Self::Arena, value: usize) -> bool;

    /// Insert a value, failing when it is outside the capacity
    fn insert(&mut self, arena: &mut Self::Arena, value: usize) -> UintSetResult<()>;

    /// Insert without validation.
    ///
    /// The caller guarantees `value < cap`; for [`ArraySet`] it must also be
    /// larger than every value already present.
    fn insert_unchecked(&mut self, arena: &mut Self::Arena, value: usize);

    /// Remove a value; removing an absent value is a no-op
    fn delete(&mut self, arena: &mut Self::Arena, value: usize) -> UintSetResult<()>;

    fn clear(&mut self, arena: &mut Self::Arena);

    /// Insert every value in `[0, cap)`
    fn fill(&mut self, arena: &mut Self::Arena);

    /// Replace the set with its complement in `[0, cap)`
    fn invert(&mut self, arena: &mut Self::Arena);

    /// In-place union
    fn union(&mut self, arena: &mut Self::Arena, other: &Self) -> UintSetResult<()>;

    /// In-place difference: remove every value present in `other`
    fn diff(&mut self, arena: &mut Self::Arena, other: &Self) -> UintSetResult<()>;

    /// Allocate an independent set with the same contents
    fn copy(&self, arena: &mut Self::Arena) -> UintSetResult<Self>;

    /// Overwrite `other` with the contents of `self`
    fn copy_into(&self, arena: &mut Self::Arena, other: &mut Self) -> UintSetResult<()>;

    /// Smallest value, if any
    fn first_or_null(&self, arena: &Self::Arena) -> Option<usize>;

    /// All values in ascending order
    fn to_vec(&self, arena: &Self::Arena) -> Vec<usize>;

    /// Keep only the values for which `keep` returns true.
    ///
    /// Values are visited in ascending order; the first error aborts the walk
    /// and leaves the set with the values decided so far removed.
    fn try_retain<E, F>(&mut self, arena: &mut Self::Arena, keep: F) -> Result<(), E>
    where
        F: FnMut(usize) -> Result<bool, E>;
}

/// Which implementation backs the version set of one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetKind {
    Inline32,
    Bitset,
    Array,
}

/// Implementation-selection flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetSelection {
    /// Use [`Bitset32`] whenever the capacity allows it
    pub small_set_optimization: bool,
    /// Use [`Bitset`] (true) or [`ArraySet`] (false) for larger capacities
    pub bitset: bool,
}

impl SetSelection {
    /// Pick the implementation for a record with `version_count` versions
    pub fn choose(&self, version_count: usize) -> SetKind {
        if self.small_set_optimization && version_count <= Bitset32::MAX_CAP {
            SetKind::Inline32
        } else if self.bitset {
            SetKind::Bitset
        } else {
            SetKind::Array
        }
    }
}

impl Default for SetSelection {
    fn default() -> Self {
        Self {
            small_set_optimization: true,
            bitset: true,
        }
    }
}

/// Portable branchless population count
pub fn pop_count_32(value: u32) -> u32 {
    let mut v = value;
    v -= (v >> 1) & 0x5555_5555;
    v = (v & 0x3333_3333) + ((v >> 2) & 0x3333_3333);
    v = (v + (v >> 4)) & 0x0F0F_0F0F;
    v.wrapping_mul(0x0101_0101) >> 24
}

/// Mask for the valid bits of the last word of a `cap`-bit bitset
pub(crate) fn tail_mask(cap: usize) -> u32 {
    match cap & 31 {
        0 => u32::MAX,
        bits => (1u32 << bits) - 1,
    }
}

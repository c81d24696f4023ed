//! Arena-backed bitset

use super::errors::{UintSetError, UintSetResult};
use super::{pop_count_32, tail_mask, UintSet, MAX_CAPACITY};

/// Bump-pointer pool of 32-bit words shared by every [`Bitset`] of one evaluation
#[derive(Debug)]
pub struct BitsetArena {
    words: Vec<u32>,
    offset: usize,
    generation: u32,
}

impl BitsetArena {
    /// Create an arena of `bytes` bytes (rounded down to whole words)
    pub fn new(bytes: usize) -> Self {
        Self {
            words: vec![0; bytes / 4],
            offset: 0,
            generation: 0,
        }
    }

    /// Release every allocation; all existing handles become invalid
    pub fn reset(&mut self) {
        self.offset = 0;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Words handed out since the last reset
    pub fn used_words(&self) -> usize {
        self.offset
    }

    pub fn capacity_words(&self) -> usize {
        self.words.len()
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    fn alloc(&mut self, len: usize) -> UintSetResult<usize> {
        let available = self.words.len() - self.offset;

        if len > available {
            return Err(UintSetError::arena_exhausted(len, available));
        }

        let off = self.offset;
        self.offset += len;
        Ok(off)
    }
}

/// Bitset of capacity ≤ 1024 whose words live in a [`BitsetArena`]
#[derive(Debug)]
pub struct Bitset {
    off: usize,
    len: usize,
    cap: usize,
    size: usize,
    generation: u32,
}

impl Bitset {
    fn range(&self) -> std::ops::Range<usize> {
        self.off..self.off + self.len
    }

    fn check_live(&self, arena: &BitsetArena) {
        debug_assert_eq!(
            self.generation, arena.generation,
            "bitset used after its arena was reset"
        );
    }

    fn check_cap(&self, other: &Self) -> UintSetResult<()> {
        if self.cap != other.cap {
            return Err(UintSetError::capacity_mismatch(self.cap, other.cap));
        }
        Ok(())
    }

    fn check_bounds(&self, value: usize) -> UintSetResult<()> {
        if value >= self.cap {
            return Err(UintSetError::out_of_bounds(value, self.cap));
        }
        Ok(())
    }

    fn mask_tail(&self, arena: &mut BitsetArena) {
        if self.len > 0 {
            arena.words[self.off + self.len - 1] &= tail_mask(self.cap);
        }
    }

    fn recount(&mut self, arena: &BitsetArena) {
        self.size = arena.words[self.range()]
            .iter()
            .map(|&w| pop_count_32(w) as usize)
            .sum();
    }
}

impl UintSet for Bitset {
    type Arena = BitsetArena;

    fn with_cap(arena: &mut BitsetArena, cap: usize) -> UintSetResult<Self> {
        if cap > MAX_CAPACITY {
            return Err(UintSetError::capacity_exceeded(cap, MAX_CAPACITY));
        }

        let len = (cap + 31) >> 5;
        let off = arena.alloc(len)?;
        arena.words[off..off + len].fill(0);

        Ok(Self {
            off,
            len,
            cap,
            size: 0,
            generation: arena.generation,
        })
    }

    fn cap(&self) -> usize {
        self.cap
    }

    fn size(&self) -> usize {
        self.size
    }

    fn has(&self, arena: &BitsetArena, value: usize) -> bool {
        self.check_live(arena);
        value < self.cap && arena.words[self.off + (value >> 5)] & (1 << (value & 31)) != 0
    }

    fn insert(&mut self, arena: &mut BitsetArena, value: usize) -> UintSetResult<()> {
        self.check_bounds(value)?;
        self.insert_unchecked(arena, value);
        Ok(())
    }

    fn insert_unchecked(&mut self, arena: &mut BitsetArena, value: usize) {
        self.check_live(arena);
        debug_assert!(value < self.cap);

        let slot = &mut arena.words[self.off + (value >> 5)];
        let bit: u32 = 1 << (value & 31);

        if *slot & bit == 0 {
            *slot |= bit;
            self.size += 1;
        }
    }

    fn delete(&mut self, arena: &mut BitsetArena, value: usize) -> UintSetResult<()> {
        self.check_bounds(value)?;
        self.check_live(arena);

        let slot = &mut arena.words[self.off + (value >> 5)];
        let bit: u32 = 1 << (value & 31);

        if *slot & bit != 0 {
            *slot &= !bit;
            self.size -= 1;
        }
        Ok(())
    }

    fn clear(&mut self, arena: &mut BitsetArena) {
        self.check_live(arena);
        arena.words[self.range()].fill(0);
        self.size = 0;
    }

    fn fill(&mut self, arena: &mut BitsetArena) {
        self.check_live(arena);
        arena.words[self.range()].fill(u32::MAX);
        self.mask_tail(arena);
        self.size = self.cap;
    }

    fn invert(&mut self, arena: &mut BitsetArena) {
        self.check_live(arena);
        for word in &mut arena.words[self.range()] {
            *word = !*word;
        }
        self.mask_tail(arena);
        self.size = self.cap - self.size;
    }

    fn union(&mut self, arena: &mut BitsetArena, other: &Self) -> UintSetResult<()> {
        self.check_cap(other)?;
        self.check_live(arena);

        for i in 0..self.len {
            arena.words[self.off + i] |= arena.words[other.off + i];
        }
        self.recount(arena);
        Ok(())
    }

    fn diff(&mut self, arena: &mut BitsetArena, other: &Self) -> UintSetResult<()> {
        self.check_cap(other)?;
        self.check_live(arena);

        for i in 0..self.len {
            arena.words[self.off + i] &= !arena.words[other.off + i];
        }
        self.recount(arena);
        Ok(())
    }

    fn copy(&self, arena: &mut BitsetArena) -> UintSetResult<Self> {
        let mut copy = Self::with_cap(arena, self.cap)?;
        self.copy_into(arena, &mut copy)?;
        Ok(copy)
    }

    fn copy_into(&self, arena: &mut BitsetArena, other: &mut Self) -> UintSetResult<()> {
        self.check_cap(other)?;
        self.check_live(arena);
        arena.words.copy_within(self.range(), other.off);
        other.size = self.size;
        Ok(())
    }

    fn first_or_null(&self, arena: &BitsetArena) -> Option<usize> {
        self.check_live(arena);

        if self.size == 0 {
            return None;
        }

        arena.words[self.range()]
            .iter()
            .enumerate()
            .find(|(_, w)| **w != 0)
            .map(|(i, w)| i * 32 + w.trailing_zeros() as usize)
    }

    fn to_vec(&self, arena: &BitsetArena) -> Vec<usize> {
        self.check_live(arena);

        let mut values = Vec::with_capacity(self.size);
        for (i, &word) in arena.words[self.range()].iter().enumerate() {
            let mut w = word;
            while w != 0 {
                values.push(i * 32 + w.trailing_zeros() as usize);
                w &= w - 1;
            }
        }
        values
    }

    fn try_retain<E, F>(&mut self, arena: &mut BitsetArena, mut keep: F) -> Result<(), E>
    where
        F: FnMut(usize) -> Result<bool, E>,
    {
        self.check_live(arena);

        for i in 0..self.len {
            let mut slot = arena.words[self.off + i];

            if slot == 0 {
                continue;
            }

            let mut pending = slot;
            let mut result = Ok(());

            while pending != 0 {
                let j = pending.trailing_zeros();
                pending &= pending - 1;

                match keep(i * 32 + j as usize) {
                    Ok(true) => {}
                    Ok(false) => {
                        slot &= !(1 << j);
                        self.size -= 1;
                    }
                    Err(e) => {
                        result = Err(e);
                        break;
                    }
                }
            }

            arena.words[self.off + i] = slot;
            result?;
        }
        Ok(())
    }
}

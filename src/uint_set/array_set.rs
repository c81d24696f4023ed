//! Arena-backed sorted array set

use super::errors::{UintSetError, UintSetResult};
use super::{UintSet, MAX_CAPACITY};

/// Slots reserved for every [`ArraySet`], independent of its capacity
const SLOTS_PER_SET: usize = MAX_CAPACITY;

/// Pool of `u16` slots shared by every [`ArraySet`] of one evaluation
#[derive(Debug)]
pub struct ArraySetArena {
    slots: Vec<u16>,
    offset: usize,
    generation: u32,
}

impl ArraySetArena {
    /// Create an arena of `bytes` bytes (rounded down to whole sets)
    pub fn new(bytes: usize) -> Self {
        let sets = bytes / 2 / SLOTS_PER_SET;
        Self {
            slots: vec![0; sets * SLOTS_PER_SET],
            offset: 0,
            generation: 0,
        }
    }

    /// Release every allocation; all existing handles become invalid
    pub fn reset(&mut self) {
        self.offset = 0;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Sets handed out since the last reset
    pub fn used_sets(&self) -> usize {
        self.offset / SLOTS_PER_SET
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    fn alloc(&mut self) -> UintSetResult<usize> {
        let available = self.slots.len() - self.offset;

        if available < SLOTS_PER_SET {
            return Err(UintSetError::arena_exhausted(SLOTS_PER_SET, available));
        }

        let off = self.offset;
        self.offset += SLOTS_PER_SET;
        Ok(off)
    }
}

/// Sorted array of distinct `u16` values, capacity ≤ 1024
#[derive(Debug)]
pub struct ArraySet {
    off: usize,
    cap: usize,
    size: usize,
    generation: u32,
}

impl ArraySet {
    fn values<'a>(&self, arena: &'a ArraySetArena) -> &'a [u16] {
        debug_assert_eq!(
            self.generation, arena.generation,
            "array set used after its arena was reset"
        );
        &arena.slots[self.off..self.off + self.size]
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

    /// Value at sorted position `idx`
    pub fn at(&self, arena: &ArraySetArena, idx: usize) -> usize {
        self.values(arena)[idx] as usize
    }

    /// Remove the value at sorted position `idx`
    pub fn delete_at(&mut self, arena: &mut ArraySetArena, idx: usize) {
        let start = self.off + idx;
        let end = self.off + self.size;
        arena.slots.copy_within(start + 1..end, start);
        self.size -= 1;
    }

    /// Replace the contents with `[0, count)`
    pub fn fill_to(&mut self, arena: &mut ArraySetArena, count: usize) -> UintSetResult<()> {
        if count > self.cap {
            return Err(UintSetError::capacity_exceeded(count, self.cap));
        }

        for (value, slot) in arena.slots[self.off..self.off + count].iter_mut().enumerate() {
            *slot = value as u16;
        }
        self.size = count;
        Ok(())
    }
}

impl UintSet for ArraySet {
    type Arena = ArraySetArena;

    fn with_cap(arena: &mut ArraySetArena, cap: usize) -> UintSetResult<Self> {
        if cap > MAX_CAPACITY {
            return Err(UintSetError::capacity_exceeded(cap, MAX_CAPACITY));
        }

        Ok(Self {
            off: arena.alloc()?,
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

    fn has(&self, arena: &ArraySetArena, value: usize) -> bool {
        value < self.cap && self.values(arena).binary_search(&(value as u16)).is_ok()
    }

    fn insert(&mut self, arena: &mut ArraySetArena, value: usize) -> UintSetResult<()> {
        self.check_bounds(value)?;

        if let Err(pos) = self.values(arena).binary_search(&(value as u16)) {
            let start = self.off + pos;
            let end = self.off + self.size;
            arena.slots.copy_within(start..end, start + 1);
            arena.slots[start] = value as u16;
            self.size += 1;
        }
        Ok(())
    }

    fn insert_unchecked(&mut self, arena: &mut ArraySetArena, value: usize) {
        debug_assert!(value < self.cap);
        debug_assert!(self.values(arena).last().map_or(true, |&last| (last as usize) < value));

        arena.slots[self.off + self.size] = value as u16;
        self.size += 1;
    }

    fn delete(&mut self, arena: &mut ArraySetArena, value: usize) -> UintSetResult<()> {
        self.check_bounds(value)?;

        if let Ok(pos) = self.values(arena).binary_search(&(value as u16)) {
            self.delete_at(arena, pos);
        }
        Ok(())
    }

    fn clear(&mut self, _arena: &mut ArraySetArena) {
        self.size = 0;
    }

    fn fill(&mut self, arena: &mut ArraySetArena) {
        let cap = self.cap;
        // cap ≤ SLOTS_PER_SET, checked at construction.
        let _ = self.fill_to(arena, cap);
    }

    fn invert(&mut self, arena: &mut ArraySetArena) {
        let present = self.values(arena).to_vec();
        let mut next = present.iter().peekable();
        let mut size = 0;

        for value in 0..self.cap {
            if next.peek().map_or(false, |&&v| v as usize == value) {
                next.next();
                continue;
            }
            arena.slots[self.off + size] = value as u16;
            size += 1;
        }
        self.size = size;
    }

    fn union(&mut self, arena: &mut ArraySetArena, other: &Self) -> UintSetResult<()> {
        self.check_cap(other)?;

        let a_len = self.size;
        let b_len = other.size;

        // First pass counts the merged size so the merge can run back to front in place.
        let merged = {
            let a = self.values(arena);
            let b = other.values(arena);
            let (mut i, mut j, mut n) = (0, 0, 0);
            while i < a_len && j < b_len {
                match a[i].cmp(&b[j]) {
                    std::cmp::Ordering::Less => i += 1,
                    std::cmp::Ordering::Greater => j += 1,
                    std::cmp::Ordering::Equal => {
                        i += 1;
                        j += 1;
                    }
                }
                n += 1;
            }
            n + (a_len - i) + (b_len - j)
        };

        let (mut i, mut j, mut k) = (a_len, b_len, merged);
        while j > 0 {
            let b = arena.slots[other.off + j - 1];

            if i > 0 && arena.slots[self.off + i - 1] >= b {
                let a = arena.slots[self.off + i - 1];
                arena.slots[self.off + k - 1] = a;
                i -= 1;
                if a == b {
                    j -= 1;
                }
            } else {
                arena.slots[self.off + k - 1] = b;
                j -= 1;
            }
            k -= 1;
        }

        self.size = merged;
        Ok(())
    }

    fn diff(&mut self, arena: &mut ArraySetArena, other: &Self) -> UintSetResult<()> {
        self.check_cap(other)?;

        let mut write = 0;
        let mut j = 0;

        for read in 0..self.size {
            let value = arena.slots[self.off + read];

            while j < other.size && arena.slots[other.off + j] < value {
                j += 1;
            }

            if j < other.size && arena.slots[other.off + j] == value {
                continue;
            }

            arena.slots[self.off + write] = value;
            write += 1;
        }

        self.size = write;
        Ok(())
    }

    fn copy(&self, arena: &mut ArraySetArena) -> UintSetResult<Self> {
        let mut copy = Self::with_cap(arena, self.cap)?;
        self.copy_into(arena, &mut copy)?;
        Ok(copy)
    }

    fn copy_into(&self, arena: &mut ArraySetArena, other: &mut Self) -> UintSetResult<()> {
        self.check_cap(other)?;
        arena.slots.copy_within(self.off..self.off + self.size, other.off);
        other.size = self.size;
        Ok(())
    }

    fn first_or_null(&self, arena: &ArraySetArena) -> Option<usize> {
        self.values(arena).first().map(|&v| v as usize)
    }

    fn to_vec(&self, arena: &ArraySetArena) -> Vec<usize> {
        self.values(arena).iter().map(|&v| v as usize).collect()
    }

    fn try_retain<E, F>(&mut self, arena: &mut ArraySetArena, mut keep: F) -> Result<(), E>
    where
        F: FnMut(usize) -> Result<bool, E>,
    {
        let mut write = 0;
        let mut result = Ok(());
        let mut read = 0;

        while read < self.size {
            let value = arena.slots[self.off + read];
            read += 1;

            match keep(value as usize) {
                Ok(true) => {
                    arena.slots[self.off + write] = value;
                    write += 1;
                }
                Ok(false) => {}
                Err(e) => {
                    // Keep the undecided tail.
                    arena.slots[self.off + write] = value;
                    write += 1;
                    result = Err(e);
                    break;
                }
            }
        }

        arena.slots.copy_within(self.off + read..self.off + self.size, self.off + write);
        self.size = write + (self.size - read);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena() -> ArraySetArena {
        ArraySetArena::new(16 * 1024)
    }

    fn set_of(arena: &mut ArraySetArena, cap: usize, values: &[usize]) -> ArraySet {
        let mut set = ArraySet::with_cap(arena, cap).unwrap();
        for &v in values {
            set.insert(arena, v).unwrap();
        }
        set
    }

    #[test]
    fn test_insert_keeps_order() {
        let mut arena = arena();
        let set = set_of(&mut arena, 100, &[50, 3, 99, 3, 0]);

        assert_eq!(set.to_vec(&arena), vec![0, 3, 50, 99]);
        assert_eq!(set.size(), 4);
        assert!(set.has(&arena, 50));
        assert!(!set.has(&arena, 51));
        assert_eq!(set.first_or_null(&arena), Some(0));
    }

    #[test]
    fn test_delete() {
        let mut arena = arena();
        let mut set = set_of(&mut arena, 10, &[1, 2, 3]);

        set.delete(&mut arena, 2).unwrap();
        set.delete(&mut arena, 7).unwrap();

        assert_eq!(set.to_vec(&arena), vec![1, 3]);
        assert!(set.delete(&mut arena, 10).is_err());
    }

    #[test]
    fn test_fill_to_full_capacity() {
        let mut arena = arena();
        let mut set = ArraySet::with_cap(&mut arena, 1024).unwrap();

        set.fill(&mut arena);

        assert_eq!(set.size(), 1024);
        assert_eq!(set.at(&arena, 1023), 1023);
    }

    #[test]
    fn test_union_merges() {
        let mut arena = arena();
        let mut a = set_of(&mut arena, 20, &[1, 4, 9, 15]);
        let b = set_of(&mut arena, 20, &[0, 4, 10, 19]);

        a.union(&mut arena, &b).unwrap();

        assert_eq!(a.to_vec(&arena), vec![0, 1, 4, 9, 10, 15, 19]);
        assert_eq!(a.size(), 7);
    }

    #[test]
    fn test_union_with_empty() {
        let mut arena = arena();
        let mut a = set_of(&mut arena, 20, &[]);
        let b = set_of(&mut arena, 20, &[2, 3]);

        a.union(&mut arena, &b).unwrap();
        assert_eq!(a.to_vec(&arena), vec![2, 3]);

        let empty = set_of(&mut arena, 20, &[]);
        a.union(&mut arena, &empty).unwrap();
        assert_eq!(a.to_vec(&arena), vec![2, 3]);
    }

    #[test]
    fn test_diff() {
        let mut arena = arena();
        let mut a = set_of(&mut arena, 20, &[1, 4, 9, 15]);
        let b = set_of(&mut arena, 20, &[0, 4, 15, 19]);

        a.diff(&mut arena, &b).unwrap();

        assert_eq!(a.to_vec(&arena), vec![1, 9]);
    }

    #[test]
    fn test_invert() {
        let mut arena = arena();
        let mut set = set_of(&mut arena, 6, &[0, 2, 5]);

        set.invert(&mut arena);

        assert_eq!(set.to_vec(&arena), vec![1, 3, 4]);
    }

    #[test]
    fn test_retain_and_delete_at() {
        let mut arena = arena();
        let mut set = ArraySet::with_cap(&mut arena, 10).unwrap();
        set.fill(&mut arena);

        set.try_retain(&mut arena, |v| Ok::<_, ()>(v % 3 == 0)).unwrap();
        assert_eq!(set.to_vec(&arena), vec![0, 3, 6, 9]);

        set.delete_at(&mut arena, 1);
        assert_eq!(set.to_vec(&arena), vec![0, 6, 9]);
    }

    #[test]
    fn test_retain_error_keeps_tail() {
        let mut arena = arena();
        let mut set = ArraySet::with_cap(&mut arena, 6).unwrap();
        set.fill(&mut arena);

        let result = set.try_retain(&mut arena, |v| if v == 3 { Err(v) } else { Ok(v != 1) });

        assert_eq!(result, Err(3));
        assert_eq!(set.to_vec(&arena), vec![0, 2, 3, 4, 5]);
    }

    #[test]
    fn test_arena_exhaustion() {
        let mut arena = ArraySetArena::new(2 * 1024 * 2);

        let _a = ArraySet::with_cap(&mut arena, 4).unwrap();
        let _b = ArraySet::with_cap(&mut arena, 4).unwrap();
        assert!(ArraySet::with_cap(&mut arena, 4).is_err());

        arena.reset();
        assert_eq!(arena.used_sets(), 0);
    }
}

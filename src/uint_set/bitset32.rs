//! Inline single-word set

use super::errors::{UintSetError, UintSetResult};
use super::{pop_count_32, tail_mask, UintSet};

/// Set of values in `[0, cap)` with `cap ≤ 32`, stored in one `u32`.
///
/// Needs no arena; the arena parameter of [`UintSet`] is `()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bitset32 {
    values: u32,
    cap: u8,
    size: u8,
}

impl Bitset32 {
    pub const MAX_CAP: usize = 32;

    /// Create an empty set without going through the trait
    pub fn new(cap: usize) -> UintSetResult<Self> {
        if cap > Self::MAX_CAP {
            return Err(UintSetError::capacity_exceeded(cap, Self::MAX_CAP));
        }

        Ok(Self {
            values: 0,
            cap: cap as u8,
            size: 0,
        })
    }

    /// Raw word; bit `i` set means value `i` present
    pub fn bits(&self) -> u32 {
        self.values
    }

    fn full_mask(&self) -> u32 {
        if self.cap == 0 {
            0
        } else {
            tail_mask(self.cap as usize)
        }
    }

    fn check_cap(&self, other: &Self) -> UintSetResult<()> {
        if self.cap != other.cap {
            return Err(UintSetError::capacity_mismatch(self.cap as usize, other.cap as usize));
        }
        Ok(())
    }

    fn check_bounds(&self, value: usize) -> UintSetResult<()> {
        if value >= self.cap as usize {
            return Err(UintSetError::out_of_bounds(value, self.cap as usize));
        }
        Ok(())
    }
}

impl UintSet for Bitset32 {
    type Arena = ();

    fn with_cap(_arena: &mut (), cap: usize) -> UintSetResult<Self> {
        Self::new(cap)
    }

    fn cap(&self) -> usize {
        self.cap as usize
    }

    fn size(&self) -> usize {
        self.size as usize
    }

    fn has(&self, _arena: &(), value: usize) -> bool {
        value < self.cap as usize && self.values & (1 << value) != 0
    }

    fn insert(&mut self, arena: &mut (), value: usize) -> UintSetResult<()> {
        self.check_bounds(value)?;
        self.insert_unchecked(arena, value);
        Ok(())
    }

    fn insert_unchecked(&mut self, _arena: &mut (), value: usize) {
        debug_assert!(value < self.cap as usize);
        let values = self.values | (1 << value);

        if values != self.values {
            self.values = values;
            self.size += 1;
        }
    }

    fn delete(&mut self, _arena: &mut (), value: usize) -> UintSetResult<()> {
        self.check_bounds(value)?;
        let values = self.values & !(1 << value);

        if values != self.values {
            self.values = values;
            self.size -= 1;
        }
        Ok(())
    }

    fn clear(&mut self, _arena: &mut ()) {
        self.values = 0;
        self.size = 0;
    }

    fn fill(&mut self, _arena: &mut ()) {
        self.values = self.full_mask();
        self.size = self.cap;
    }

    fn invert(&mut self, _arena: &mut ()) {
        self.values = !self.values & self.full_mask();
        self.size = self.cap - self.size;
    }

    fn union(&mut self, _arena: &mut (), other: &Self) -> UintSetResult<()> {
        self.check_cap(other)?;
        self.values |= other.values;
        self.size = pop_count_32(self.values) as u8;
        Ok(())
    }

    fn diff(&mut self, _arena: &mut (), other: &Self) -> UintSetResult<()> {
        self.check_cap(other)?;
        self.values &= !other.values;
        self.size = pop_count_32(self.values) as u8;
        Ok(())
    }

    fn copy(&self, _arena: &mut ()) -> UintSetResult<Self> {
        Ok(*self)
    }

    fn copy_into(&self, _arena: &mut (), other: &mut Self) -> UintSetResult<()> {
        self.check_cap(other)?;
        other.values = self.values;
        other.size = self.size;
        Ok(())
    }

    fn first_or_null(&self, _arena: &()) -> Option<usize> {
        if self.values == 0 {
            None
        } else {
            Some(self.values.trailing_zeros() as usize)
        }
    }

    fn to_vec(&self, _arena: &()) -> Vec<usize> {
        (0..self.cap as usize)
            .filter(|&i| self.values & (1 << i) != 0)
            .collect()
    }

    fn try_retain<E, F>(&mut self, _arena: &mut (), mut keep: F) -> Result<(), E>
    where
        F: FnMut(usize) -> Result<bool, E>,
    {
        for value in 0..self.cap as usize {
            let bit: u32 = 1 << value;

            if self.values & bit == 0 {
                continue;
            }

            if !keep(value)? {
                self.values &= !bit;
                self.size -= 1;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_of(cap: usize, values: &[usize]) -> Bitset32 {
        let mut set = Bitset32::new(cap).unwrap();
        for &v in values {
            set.insert(&mut (), v).unwrap();
        }
        set
    }

    #[test]
    fn test_new_is_empty() {
        let set = Bitset32::new(20).unwrap();
        assert_eq!(set.size(), 0);
        assert_eq!(set.cap(), 20);
        assert_eq!(set.first_or_null(&()), None);
        assert!(Bitset32::new(33).is_err());
    }

    #[test]
    fn test_fill() {
        for cap in [0, 1, 7, 31, 32] {
            let mut set = Bitset32::new(cap).unwrap();
            set.fill(&mut ());
            assert_eq!(set.size(), cap);
            assert_eq!(set.to_vec(&()), (0..cap).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_insert_delete() {
        let mut set = set_of(10, &[3, 3, 7]);
        assert_eq!(set.size(), 2);
        assert!(set.has(&(), 3));
        assert!(!set.has(&(), 11));

        set.delete(&mut (), 3).unwrap();
        set.delete(&mut (), 3).unwrap();
        assert_eq!(set.size(), 1);
        assert_eq!(set.first_or_null(&()), Some(7));

        assert!(set.insert(&mut (), 10).is_err());
        assert!(set.delete(&mut (), 10).is_err());
    }

    #[test]
    fn test_invert_full_word() {
        let mut set = set_of(32, &[0, 31]);
        set.invert(&mut ());
        assert_eq!(set.size(), 30);
        assert!(!set.has(&(), 0));
        assert!(set.has(&(), 1));
        assert!(!set.has(&(), 31));
    }

    #[test]
    fn test_union_diff() {
        let mut a = set_of(8, &[1, 2, 5]);
        let b = set_of(8, &[2, 6]);

        a.union(&mut (), &b).unwrap();
        assert_eq!(a.to_vec(&()), vec![1, 2, 5, 6]);
        assert_eq!(a.size(), 4);

        a.diff(&mut (), &b).unwrap();
        assert_eq!(a.to_vec(&()), vec![1, 5]);
        assert_eq!(a.size(), 2);

        let c = set_of(9, &[]);
        assert!(a.union(&mut (), &c).is_err());
    }

    #[test]
    fn test_retain() {
        let mut set = Bitset32::new(6).unwrap();
        set.fill(&mut ());
        set.try_retain(&mut (), |v| Ok::<_, ()>(v % 2 == 1)).unwrap();
        assert_eq!(set.to_vec(&()), vec![1, 3, 5]);
        assert_eq!(set.size(), 3);
    }
}

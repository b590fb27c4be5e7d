//! Generic fixed-capacity slot pool with an intrusive free list.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use crate::error::{RtError, RtResult};

/// Occupancy snapshot for one pool, exposed through runtime introspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    /// Total number of slots.
    pub capacity: usize,
    /// Slots currently allocated.
    pub in_use: usize,
}

struct Slot<T> {
    value: Option<T>,
    /// Bumped on release so stale generation-tagged handles stop matching.
    generation: u16,
    next_free: Option<u16>,
}

/// A fixed array of slots plus an intrusive free list of slot indices.
///
/// The pool is allocated once; `alloc` and `release` are O(1) and never touch
/// the allocator. Slot indices fit in `u16`, which bounds every pool at
/// 65535 slots and keeps handles within their 32-bit layout.
pub struct SlotPool<T> {
    name: &'static str,
    slots: Box<[Slot<T>]>,
    free_head: Option<u16>,
    in_use: usize,
}

impl<T> SlotPool<T> {
    /// Create a pool with `capacity` slots, all free.
    ///
    /// `name` appears in `NoMem` errors and pool statistics.
    ///
    /// # Panics
    /// Panics if `capacity` exceeds 65535; configuration validation rejects
    /// such capacities before any pool is built.
    pub fn new(name: &'static str, capacity: usize) -> Self {
        assert!(capacity <= usize::from(u16::MAX), "pool capacity exceeds u16 indexing");
        let mut slots = Vec::with_capacity(capacity);
        for i in 0..capacity {
            let next = i + 1;
            slots.push(Slot {
                value: None,
                generation: 0,
                next_free: if next < capacity { Some(next as u16) } else { None },
            });
        }
        SlotPool {
            name,
            slots: slots.into_boxed_slice(),
            free_head: if capacity > 0 { Some(0) } else { None },
            in_use: 0,
        }
    }

    /// Allocate a slot for `value`, returning `(slot, generation)`.
    pub fn alloc(&mut self, value: T) -> RtResult<(u16, u16)> {
        let idx = self.free_head.ok_or(RtError::NoMem(self.name))?;
        let slot = &mut self.slots[usize::from(idx)];
        self.free_head = slot.next_free.take();
        debug_assert!(slot.value.is_none());
        slot.value = Some(value);
        self.in_use += 1;
        Ok((idx, slot.generation))
    }

    /// Release a slot, bumping its generation and returning the value.
    ///
    /// Returns `None` if the slot is already free.
    pub fn release(&mut self, idx: u16) -> Option<T> {
        let slot = self.slots.get_mut(usize::from(idx))?;
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        slot.next_free = self.free_head;
        self.free_head = Some(idx);
        self.in_use -= 1;
        Some(value)
    }

    /// Borrow the value in `idx`, if occupied.
    pub fn get(&self, idx: u16) -> Option<&T> {
        self.slots.get(usize::from(idx))?.value.as_ref()
    }

    /// Mutably borrow the value in `idx`, if occupied.
    pub fn get_mut(&mut self, idx: u16) -> Option<&mut T> {
        self.slots.get_mut(usize::from(idx))?.value.as_mut()
    }

    /// Borrow the value in `idx` only if the slot's generation matches.
    pub fn get_checked(&self, idx: u16, generation: u16) -> Option<&T> {
        let slot = self.slots.get(usize::from(idx))?;
        if slot.generation != generation {
            return None;
        }
        slot.value.as_ref()
    }

    /// Mutably borrow the value in `idx` only if the generation matches.
    pub fn get_checked_mut(&mut self, idx: u16, generation: u16) -> Option<&mut T> {
        let slot = self.slots.get_mut(usize::from(idx))?;
        if slot.generation != generation {
            return None;
        }
        slot.value.as_mut()
    }

    /// Current generation of a slot.
    pub fn generation(&self, idx: u16) -> Option<u16> {
        self.slots.get(usize::from(idx)).map(|s| s.generation)
    }

    /// Iterate `(slot, value)` over occupied slots.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.value.as_ref().map(|v| (i as u16, v)))
    }

    /// Slot indices of all occupied slots, in index order.
    pub fn occupied(&self) -> Vec<u16> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.value.as_ref().map(|_| i as u16))
            .collect()
    }

    /// Total slot count.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Currently allocated slot count.
    pub fn in_use(&self) -> usize {
        self.in_use
    }

    /// Occupancy snapshot.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            capacity: self.capacity(),
            in_use: self.in_use(),
        }
    }
}

impl<T> std::fmt::Debug for SlotPool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotPool")
            .field("name", &self.name)
            .field("capacity", &self.capacity())
            .field("in_use", &self.in_use)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_release_round_trip() {
        let mut pool: SlotPool<u32> = SlotPool::new("test", 4);
        let (slot, generation) = pool.alloc(42).unwrap();
        assert_eq!(pool.get(slot), Some(&42));
        assert_eq!(pool.get_checked(slot, generation), Some(&42));
        assert_eq!(pool.in_use(), 1);

        assert_eq!(pool.release(slot), Some(42));
        assert_eq!(pool.get(slot), None);
        assert_eq!(pool.in_use(), 0);
    }

    #[test]
    fn test_exhaustion_reports_pool_name() {
        let mut pool: SlotPool<u8> = SlotPool::new("tiny", 2);
        pool.alloc(1).unwrap();
        pool.alloc(2).unwrap();
        let err = pool.alloc(3).unwrap_err();
        assert_eq!(err, RtError::NoMem("tiny"));
    }

    #[test]
    fn test_release_makes_slot_reusable() {
        let mut pool: SlotPool<u8> = SlotPool::new("tiny", 1);
        let (slot, _) = pool.alloc(1).unwrap();
        assert!(pool.alloc(2).is_err());
        pool.release(slot);
        assert!(pool.alloc(2).is_ok());
    }

    #[test]
    fn test_generation_bumps_on_release() {
        let mut pool: SlotPool<u8> = SlotPool::new("gen", 1);
        let (slot, g0) = pool.alloc(1).unwrap();
        pool.release(slot);
        let (slot2, g1) = pool.alloc(2).unwrap();
        assert_eq!(slot, slot2);
        assert_eq!(g1, g0 + 1);
        // A handle minted against g0 no longer resolves.
        assert_eq!(pool.get_checked(slot, g0), None);
        assert_eq!(pool.get_checked(slot, g1), Some(&2));
    }

    #[test]
    fn test_double_release_is_none() {
        let mut pool: SlotPool<u8> = SlotPool::new("dup", 1);
        let (slot, _) = pool.alloc(9).unwrap();
        assert_eq!(pool.release(slot), Some(9));
        assert_eq!(pool.release(slot), None);
        assert_eq!(pool.in_use(), 0);
    }

    #[test]
    fn test_iter_visits_occupied_only() {
        let mut pool: SlotPool<u8> = SlotPool::new("iter", 4);
        let (a, _) = pool.alloc(10).unwrap();
        let (b, _) = pool.alloc(20).unwrap();
        pool.release(a);
        let seen: Vec<(u16, u8)> = pool.iter().map(|(i, v)| (i, *v)).collect();
        assert_eq!(seen, vec![(b, 20)]);
    }

    #[test]
    fn test_zero_capacity_pool() {
        let mut pool: SlotPool<u8> = SlotPool::new("empty", 0);
        assert!(pool.alloc(1).is_err());
        assert_eq!(pool.stats(), PoolStats { capacity: 0, in_use: 0 });
    }
}

//! Slot map from actor handles to control blocks.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use super::cell::{ActorCell, ActorState};
use crate::error::RtResult;
use crate::pool::{PoolStats, SlotPool};
use crate::util::ActorId;

/// The actor table: a generation-checked slot map. A handle resolves iff its
/// slot is occupied and the embedded generation matches the slot's current
/// generation, so recycled slots never answer to stale handles.
#[derive(Debug)]
pub(crate) struct ActorTable {
    pool: SlotPool<ActorCell>,
}

impl ActorTable {
    pub fn new(capacity: usize) -> Self {
        ActorTable {
            pool: SlotPool::new("actor table", capacity),
        }
    }

    /// Insert a fresh control block, assigning and returning its handle.
    pub fn insert(&mut self, cell: ActorCell) -> RtResult<ActorId> {
        let (slot, generation) = self.pool.alloc(cell)?;
        let id = ActorId::from_parts(slot, generation);
        if let Some(cell) = self.pool.get_mut(slot) {
            cell.id = id;
        }
        Ok(id)
    }

    pub fn get(&self, id: ActorId) -> Option<&ActorCell> {
        let slot = id.slot()?;
        self.pool.get_checked(slot, id.generation())
    }

    pub fn get_mut(&mut self, id: ActorId) -> Option<&mut ActorCell> {
        let slot = id.slot()?;
        self.pool.get_checked_mut(slot, id.generation())
    }

    /// Remove a control block, bumping the slot generation.
    pub fn remove(&mut self, id: ActorId) -> Option<ActorCell> {
        let slot = id.slot()?;
        // Verify the generation before releasing the slot.
        self.pool.get_checked(slot, id.generation())?;
        self.pool.release(slot)
    }

    /// Whether the handle refers to a live (not Dead) actor.
    pub fn is_alive(&self, id: ActorId) -> bool {
        self.get(id).is_some_and(|cell| cell.state != ActorState::Dead)
    }

    /// Handles of all occupied slots, in slot order.
    pub fn ids(&self) -> Vec<ActorId> {
        self.pool.iter().map(|(_, cell)| cell.id).collect()
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.pool.in_use()
    }

    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }
}

//! Deadline-ordered timer list over the timer pool.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use crate::error::{RtError, RtResult};
use crate::ipc::{Header, MessageClass};
use crate::monitoring::RuntimeEventKind;
use crate::pool::{PoolStats, SlotPool};
use crate::runtime::context::Runtime;
use crate::util::{ActorId, TimerId};

#[derive(Debug)]
pub(crate) struct TimerRecord {
    pub id: TimerId,
    pub owner: ActorId,
    /// Absolute deadline in runtime micros.
    pub deadline: u64,
    /// 0 for one-shot; otherwise the reschedule period in micros.
    pub period_us: u64,
    pub next: Option<u16>,
}

/// Pool-backed, deadline-ordered singly linked list. Insertion is O(n) in
/// pending timers; expiry pops from the head. Ties insert behind existing
/// entries so equal-deadline timers fire in registration order.
#[derive(Debug)]
pub(crate) struct TimerService {
    pool: SlotPool<TimerRecord>,
    head: Option<u16>,
}

impl TimerService {
    pub fn new(capacity: usize) -> Self {
        TimerService {
            pool: SlotPool::new("timer pool", capacity),
            head: None,
        }
    }

    /// Register a timer; `period_us == 0` means one-shot.
    pub fn create(&mut self, owner: ActorId, deadline: u64, period_us: u64) -> RtResult<TimerId> {
        let record = TimerRecord {
            id: TimerId::INVALID,
            owner,
            deadline,
            period_us,
            next: None,
        };
        let (slot, generation) = self.pool.alloc(record)?;
        let id = TimerId::from_parts(slot, generation);
        if let Some(record) = self.pool.get_mut(slot) {
            record.id = id;
        }
        self.insert_sorted(slot);
        Ok(id)
    }

    /// Remove a pending timer. Stale or unknown handles are argument
    /// errors; ticks already delivered to the owner's mailbox stay there.
    pub fn cancel(&mut self, id: TimerId) -> RtResult<()> {
        let slot = self
            .slot_of(id)
            .ok_or(RtError::Invalid("no such timer"))?;
        self.unlink(slot);
        self.pool.release(slot);
        Ok(())
    }

    /// Drop every timer owned by a dying actor.
    pub fn cancel_owned(&mut self, owner: ActorId) {
        let owned: Vec<u16> = self
            .pool
            .iter()
            .filter(|(_, record)| record.owner == owner)
            .map(|(slot, _)| slot)
            .collect();
        for slot in owned {
            self.unlink(slot);
            self.pool.release(slot);
        }
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<u64> {
        self.head.and_then(|slot| self.pool.get(slot)).map(|r| r.deadline)
    }

    /// Pop one due timer, rescheduling it first if periodic. Returns the
    /// tick to deliver, or `None` when nothing is due at `now`.
    pub fn pop_due(&mut self, now: u64) -> Option<(TimerId, ActorId)> {
        let slot = self.head?;
        let (id, owner, deadline, period_us) = {
            let record = self.pool.get(slot)?;
            (record.id, record.owner, record.deadline, record.period_us)
        };
        if deadline > now {
            return None;
        }
        self.head = self.pool.get(slot).and_then(|r| r.next);
        if period_us > 0 {
            // Drift-free: the next deadline advances from the scheduled
            // time, not from `now`.
            if let Some(record) = self.pool.get_mut(slot) {
                record.deadline = deadline + period_us;
                record.next = None;
            }
            self.insert_sorted(slot);
        } else {
            self.pool.release(slot);
        }
        Some((id, owner))
    }

    /// Whether any timer is pending.
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Resolve a handle to its slot, checking the (truncated) generation.
    fn slot_of(&self, id: TimerId) -> Option<u16> {
        let slot = id.slot()?;
        self.pool.get(slot)?;
        let generation = self.pool.generation(slot)?;
        let mask = (1u16 << TimerId::GENERATION_BITS) - 1;
        if generation & mask != id.generation() {
            return None;
        }
        Some(slot)
    }

    fn insert_sorted(&mut self, slot: u16) {
        let Some(deadline) = self.pool.get(slot).map(|r| r.deadline) else {
            return;
        };
        let head_first = self
            .head
            .and_then(|h| self.pool.get(h))
            .is_none_or(|r| r.deadline > deadline);
        if head_first {
            let old_head = self.head;
            if let Some(record) = self.pool.get_mut(slot) {
                record.next = old_head;
            }
            self.head = Some(slot);
            return;
        }
        // Walk to the last entry with deadline <= the new one.
        let mut cur = self.head;
        while let Some(c) = cur {
            let next = self.pool.get(c).and_then(|r| r.next);
            let advance = next
                .and_then(|n| self.pool.get(n))
                .is_some_and(|r| r.deadline <= deadline);
            if !advance {
                if let Some(record) = self.pool.get_mut(slot) {
                    record.next = next;
                }
                if let Some(record) = self.pool.get_mut(c) {
                    record.next = Some(slot);
                }
                return;
            }
            cur = next;
        }
    }

    fn unlink(&mut self, slot: u16) {
        if self.head == Some(slot) {
            self.head = self.pool.get(slot).and_then(|r| r.next);
            return;
        }
        let mut cur = self.head;
        while let Some(c) = cur {
            let next = self.pool.get(c).and_then(|r| r.next);
            if next == Some(slot) {
                let after = self.pool.get(slot).and_then(|r| r.next);
                if let Some(record) = self.pool.get_mut(c) {
                    record.next = after;
                }
                return;
            }
            cur = next;
        }
    }
}

impl Runtime {
    /// Deliver ticks for every due timer. Returns whether any tick was
    /// posted (and so possibly made an actor runnable).
    pub(crate) fn expire_timers(&mut self) -> bool {
        let now = self.now_micros();
        let mut fired = false;
        while let Some((id, owner)) = self.timers.pop_due(now) {
            fired = true;
            self.emit(RuntimeEventKind::TimerFired { timer: id, owner });
            let header = Header::new(MessageClass::Timer, id.as_u32());
            // An exhausted pool drops the tick; the timer itself stays
            // scheduled (periodic) or is already gone (one-shot).
            let _ = self.deliver(owner, owner, header, &[]);
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> ActorId {
        ActorId::from_parts(0, 1)
    }

    #[test]
    fn test_pop_due_in_deadline_order() {
        let mut timers = TimerService::new(8);
        let late = timers.create(owner(), 3_000, 0).unwrap();
        let early = timers.create(owner(), 1_000, 0).unwrap();
        let mid = timers.create(owner(), 2_000, 0).unwrap();

        assert_eq!(timers.next_deadline(), Some(1_000));
        assert_eq!(timers.pop_due(5_000), Some((early, owner())));
        assert_eq!(timers.pop_due(5_000), Some((mid, owner())));
        assert_eq!(timers.pop_due(5_000), Some((late, owner())));
        assert_eq!(timers.pop_due(5_000), None);
        assert!(timers.is_empty());
    }

    #[test]
    fn test_nothing_due_before_deadline() {
        let mut timers = TimerService::new(4);
        timers.create(owner(), 10_000, 0).unwrap();
        assert_eq!(timers.pop_due(9_999), None);
        assert!(timers.pop_due(10_000).is_some());
    }

    #[test]
    fn test_periodic_reschedules_drift_free() {
        let mut timers = TimerService::new(4);
        let id = timers.create(owner(), 1_000, 500).unwrap();
        assert_eq!(timers.pop_due(1_200), Some((id, owner())));
        // Rescheduled from the original deadline, not from `now`.
        assert_eq!(timers.next_deadline(), Some(1_500));
        assert_eq!(timers.pop_due(1_600), Some((id, owner())));
        assert_eq!(timers.next_deadline(), Some(2_000));
    }

    #[test]
    fn test_cancel_removes_pending() {
        let mut timers = TimerService::new(4);
        let id = timers.create(owner(), 1_000, 0).unwrap();
        timers.cancel(id).unwrap();
        assert!(timers.is_empty());
        assert_eq!(timers.pop_due(5_000), None);
    }

    #[test]
    fn test_double_cancel_is_invalid() {
        let mut timers = TimerService::new(4);
        let id = timers.create(owner(), 1_000, 0).unwrap();
        timers.cancel(id).unwrap();
        assert_eq!(timers.cancel(id), Err(RtError::Invalid("no such timer")));
    }

    #[test]
    fn test_stale_handle_after_slot_reuse() {
        let mut timers = TimerService::new(1);
        let first = timers.create(owner(), 1_000, 0).unwrap();
        timers.cancel(first).unwrap();
        let second = timers.create(owner(), 2_000, 0).unwrap();
        assert_ne!(first, second);
        assert_eq!(timers.cancel(first), Err(RtError::Invalid("no such timer")));
        timers.cancel(second).unwrap();
    }

    #[test]
    fn test_cancel_owned_sweeps_only_that_owner() {
        let mut timers = TimerService::new(8);
        let other = ActorId::from_parts(1, 1);
        timers.create(owner(), 1_000, 0).unwrap();
        timers.create(other, 2_000, 0).unwrap();
        timers.create(owner(), 3_000, 0).unwrap();
        timers.cancel_owned(owner());
        assert_eq!(timers.stats().in_use, 1);
        assert_eq!(timers.next_deadline(), Some(2_000));
    }

    #[test]
    fn test_equal_deadlines_fire_in_registration_order() {
        let mut timers = TimerService::new(4);
        let a = timers.create(owner(), 1_000, 0).unwrap();
        let b = timers.create(owner(), 1_000, 0).unwrap();
        assert_eq!(timers.pop_due(1_000), Some((a, owner())));
        assert_eq!(timers.pop_due(1_000), Some((b, owner())));
    }

    #[test]
    fn test_pool_exhaustion() {
        let mut timers = TimerService::new(1);
        timers.create(owner(), 1, 0).unwrap();
        assert!(matches!(
            timers.create(owner(), 2, 0),
            Err(RtError::NoMem(_))
        ));
    }
}

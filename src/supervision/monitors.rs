//! Unidirectional monitors.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use crate::actor::cell::{ActorState, ExitReason};
use crate::error::{RtError, RtResult};
use crate::runtime::context::{with_rt, Runtime};
use crate::util::{ActorId, MonitorRef};

/// One monitor registration, chained into the target's watcher list.
#[derive(Debug)]
pub(crate) struct MonitorEntry {
    pub observer: ActorId,
    pub target: ActorId,
    pub reference: MonitorRef,
    pub next: Option<u16>,
}

/// Monitor `target` from the current actor.
///
/// Delivers exactly one System-class exit message to the observer when the
/// target dies. Monitoring an already-dead (or stale) target delivers the
/// exit message immediately with reason `Normal` and returns the invalid
/// reference, since there is no registration left to cancel.
pub fn monitor(target: ActorId) -> RtResult<MonitorRef> {
    with_rt(|rt| {
        let me = rt.current_id()?;
        rt.monitor_inner(me, target)
    })
}

/// Cancel a monitor registration. Fails with `Invalid` for a stale or
/// already-cancelled reference, so double-demonitor is detected.
pub fn demonitor(reference: MonitorRef) -> RtResult<()> {
    with_rt(|rt| {
        let me = rt.current_id()?;
        let entry = rt.remove_monitor_entry(reference)?;
        if let Some(cell) = rt.actors.get_mut(me) {
            cell.held_monitors.retain(|r| *r != entry);
        }
        Ok(())
    })
}

impl Runtime {
    pub(crate) fn monitor_inner(
        &mut self,
        observer: ActorId,
        target: ActorId,
    ) -> RtResult<MonitorRef> {
        if !target.is_valid() {
            return Err(RtError::Invalid("invalid target handle"));
        }
        let alive = self
            .actors
            .get(target)
            .is_some_and(|cell| cell.state != ActorState::Dead);
        if !alive {
            self.deliver_exit(observer, target, ExitReason::Normal);
            return Ok(MonitorRef::INVALID);
        }

        let head = self.actors.get(target).and_then(|cell| cell.watchers);
        let (slot, generation) = self.monitors.alloc(MonitorEntry {
            observer,
            target,
            reference: MonitorRef::INVALID,
            next: head,
        })?;
        let reference = MonitorRef::from_parts(slot, generation);
        if let Some(entry) = self.monitors.get_mut(slot) {
            entry.reference = reference;
        }
        if let Some(cell) = self.actors.get_mut(target) {
            cell.watchers = Some(slot);
        }
        if let Some(cell) = self.actors.get_mut(observer) {
            cell.held_monitors.push(reference);
        }
        Ok(reference)
    }

    /// Unchain and release the registration behind `reference`. Returns the
    /// reference on success so callers can clean their held lists.
    pub(crate) fn remove_monitor_entry(&mut self, reference: MonitorRef) -> RtResult<MonitorRef> {
        let slot = reference
            .slot()
            .ok_or(RtError::Invalid("no such monitor"))?;
        let valid = self
            .monitors
            .get_checked(slot, reference.generation())
            .is_some();
        if !valid {
            return Err(RtError::Invalid("no such monitor"));
        }
        let target = self
            .monitors
            .get(slot)
            .map(|entry| entry.target)
            .unwrap_or(ActorId::INVALID);
        self.unchain_watcher(target, slot);
        self.monitors.release(slot);
        Ok(reference)
    }

    fn unchain_watcher(&mut self, target: ActorId, slot: u16) {
        let head = self.actors.get(target).and_then(|cell| cell.watchers);
        if head == Some(slot) {
            let next = self.monitors.get(slot).and_then(|entry| entry.next);
            if let Some(cell) = self.actors.get_mut(target) {
                cell.watchers = next;
            }
            return;
        }
        let mut cur = head;
        while let Some(c) = cur {
            let next = self.monitors.get(c).and_then(|entry| entry.next);
            if next == Some(slot) {
                let after = self.monitors.get(slot).and_then(|entry| entry.next);
                if let Some(entry) = self.monitors.get_mut(c) {
                    entry.next = after;
                }
                return;
            }
            cur = next;
        }
    }

    /// Epilogue step: deliver one exit message per watcher of `dying` and
    /// release the registrations.
    pub(crate) fn notify_watchers(&mut self, dying: ActorId, reason: ExitReason) {
        let mut cur = self
            .actors
            .get_mut(dying)
            .and_then(|cell| cell.watchers.take());
        while let Some(slot) = cur {
            let Some(entry) = self.monitors.release(slot) else {
                break;
            };
            cur = entry.next;
            if let Some(cell) = self.actors.get_mut(entry.observer) {
                cell.held_monitors.retain(|r| *r != entry.reference);
            }
            if entry.observer != dying {
                self.deliver_exit(entry.observer, dying, reason);
            }
        }
    }

    /// Epilogue step: release every monitor the dying observer still holds
    /// on other actors, so its pool accounting drops to zero.
    pub(crate) fn drop_held_monitors(&mut self, dying: ActorId) {
        let held = self
            .actors
            .get_mut(dying)
            .map(|cell| std::mem::take(&mut cell.held_monitors))
            .unwrap_or_default();
        for reference in held {
            let _ = self.remove_monitor_entry(reference);
        }
    }
}

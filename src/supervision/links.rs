//! Bidirectional links.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use crate::actor::cell::{ActorState, ExitReason};
use crate::error::{RtError, RtResult};
use crate::runtime::context::{with_rt, Runtime};
use crate::util::ActorId;

/// One direction of a link; each link consumes two entries, one in each
/// peer's chain.
#[derive(Debug)]
pub(crate) struct LinkEntry {
    pub peer: ActorId,
    pub next: Option<u16>,
}

/// Link the current actor with `peer`.
///
/// When either side dies, the other receives a System-class exit message
/// with the dead actor's handle and reason. Linking consumes two link pool
/// slots. Linking to self is permitted and degenerate: the actor is already
/// dying when delivery would occur, so no message is sent.
pub fn link(peer: ActorId) -> RtResult<()> {
    with_rt(|rt| {
        let me = rt.current_id()?;
        rt.link_pair(me, peer)
    })
}

/// Remove the link between the current actor and `peer`, releasing both
/// entries. Fails with `Invalid` if no such link exists.
pub fn unlink(peer: ActorId) -> RtResult<()> {
    with_rt(|rt| {
        let me = rt.current_id()?;
        let mine = rt.remove_link_entry(me, peer);
        let theirs = rt.remove_link_entry(peer, me);
        if mine || theirs {
            Ok(())
        } else {
            Err(RtError::Invalid("not linked"))
        }
    })
}

impl Runtime {
    pub(crate) fn link_pair(&mut self, a: ActorId, b: ActorId) -> RtResult<()> {
        let b_alive = self
            .actors
            .get(b)
            .is_some_and(|cell| cell.state != ActorState::Dead);
        if !b.is_valid() {
            return Err(RtError::Invalid("invalid peer handle"));
        }
        if !b_alive {
            return Err(RtError::Closed);
        }
        let first = self.push_link(a, b)?;
        if let Err(err) = self.push_link(b, a) {
            // Roll the half-installed link back before surfacing NoMem.
            self.unlink_entry_slot(a, first);
            return Err(err);
        }
        Ok(())
    }

    fn push_link(&mut self, owner: ActorId, peer: ActorId) -> RtResult<u16> {
        let head = self
            .actors
            .get(owner)
            .ok_or(RtError::Closed)?
            .links;
        let (slot, _) = self.links.alloc(LinkEntry { peer, next: head })?;
        if let Some(cell) = self.actors.get_mut(owner) {
            cell.links = Some(slot);
        }
        Ok(slot)
    }

    /// Remove the first entry for `peer` from `owner`'s chain. Returns
    /// whether an entry was removed.
    pub(crate) fn remove_link_entry(&mut self, owner: ActorId, peer: ActorId) -> bool {
        let mut prev: Option<u16> = None;
        let mut cur = match self.actors.get(owner) {
            Some(cell) => cell.links,
            None => return false,
        };
        while let Some(slot) = cur {
            let (entry_peer, next) = match self.links.get(slot) {
                Some(entry) => (entry.peer, entry.next),
                None => return false,
            };
            if entry_peer == peer {
                match prev {
                    None => {
                        if let Some(cell) = self.actors.get_mut(owner) {
                            cell.links = next;
                        }
                    }
                    Some(p) => {
                        if let Some(entry) = self.links.get_mut(p) {
                            entry.next = next;
                        }
                    }
                }
                self.links.release(slot);
                return true;
            }
            prev = cur;
            cur = next;
        }
        false
    }

    /// Remove one specific slot from `owner`'s chain (rollback path).
    fn unlink_entry_slot(&mut self, owner: ActorId, slot: u16) {
        let head = self.actors.get(owner).and_then(|cell| cell.links);
        if head == Some(slot) {
            let next = self.links.get(slot).and_then(|entry| entry.next);
            if let Some(cell) = self.actors.get_mut(owner) {
                cell.links = next;
            }
            self.links.release(slot);
            return;
        }
        let mut cur = head;
        while let Some(c) = cur {
            let next = self.links.get(c).and_then(|entry| entry.next);
            if next == Some(slot) {
                let after = self.links.get(slot).and_then(|entry| entry.next);
                if let Some(entry) = self.links.get_mut(c) {
                    entry.next = after;
                }
                self.links.release(slot);
                return;
            }
            cur = next;
        }
    }

    /// Epilogue step: notify every linked peer of `dying`'s exit and drop
    /// both sides of each link. Self-link entries are released without
    /// delivery.
    pub(crate) fn notify_links(&mut self, dying: ActorId, reason: ExitReason) {
        let mut cur = self.actors.get_mut(dying).and_then(|cell| cell.links.take());
        while let Some(slot) = cur {
            let Some(entry) = self.links.release(slot) else {
                break;
            };
            cur = entry.next;
            let peer = entry.peer;
            if peer == dying {
                continue;
            }
            self.remove_link_entry(peer, dying);
            self.deliver_exit(peer, dying, reason);
        }
    }
}

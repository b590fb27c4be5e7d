//! Mailbox delivery and extraction against the envelope and payload pools.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use super::envelope::{fill_payload, payload_data, Envelope};
use super::header::Header;
use super::message::{MatchFilter, Message, MAX_PAYLOAD};
use crate::actor::cell::ActorState;
use crate::error::{RtError, RtResult};
use crate::monitoring::RuntimeEventKind;
use crate::runtime::context::Runtime;
use crate::util::ActorId;
use crate::wait::WakeStatus;

impl Runtime {
    /// Append a message to `to`'s mailbox, copying `data` into a fresh
    /// payload slot, and wake the receiver if the delivery satisfies its
    /// wait reason. The sender never blocks.
    pub(crate) fn deliver(
        &mut self,
        to: ActorId,
        sender: ActorId,
        header: Header,
        data: &[u8],
    ) -> RtResult<()> {
        if !to.is_valid() {
            return Err(RtError::Invalid("invalid target handle"));
        }
        if data.len() > MAX_PAYLOAD {
            return Err(RtError::Invalid("payload exceeds maximum message size"));
        }
        let alive = self
            .actors
            .get(to)
            .is_some_and(|cell| cell.state != ActorState::Dead);
        if !alive {
            return Err(RtError::Closed);
        }

        // Payload first: if it fails the envelope slot was never taken.
        let payload = if data.is_empty() {
            None
        } else {
            match self.payloads.alloc([0u8; super::message::MAX_MESSAGE_SIZE]) {
                Ok((slot, _)) => {
                    if let Some(buf) = self.payloads.get_mut(slot) {
                        fill_payload(buf, header, data);
                    }
                    Some(slot)
                }
                Err(err) => {
                    self.emit(RuntimeEventKind::MessageDropped {
                        to,
                        pool: "payload pool",
                    });
                    return Err(err);
                }
            }
        };

        let envelope = Envelope {
            sender,
            header: header.encode(),
            payload,
            len: data.len(),
            next: None,
        };
        let slot = match self.envelopes.alloc(envelope) {
            Ok((slot, _)) => slot,
            Err(err) => {
                if let Some(p) = payload {
                    self.payloads.release(p);
                }
                self.emit(RuntimeEventKind::MessageDropped {
                    to,
                    pool: "envelope pool",
                });
                return Err(err);
            }
        };

        // Link at the tail.
        let tail = self.actors.get(to).and_then(|cell| cell.mbox_tail);
        match tail {
            Some(t) => {
                if let Some(prev) = self.envelopes.get_mut(t) {
                    prev.next = Some(slot);
                }
            }
            None => {
                if let Some(cell) = self.actors.get_mut(to) {
                    cell.mbox_head = Some(slot);
                }
            }
        }
        if let Some(cell) = self.actors.get_mut(to) {
            cell.mbox_tail = Some(slot);
            cell.mbox_len += 1;
        }

        // Wake the receiver if this delivery is what it waits for.
        let satisfied = self.actors.get(to).is_some_and(|cell| {
            cell.is_suspended()
                && cell
                    .wait
                    .as_ref()
                    .and_then(|reason| reason.pop_filter())
                    .is_some_and(|filter| filter.matches(sender, header))
        });
        if satisfied {
            self.wake_actor(to, WakeStatus::Ok);
        }
        Ok(())
    }

    /// Take the first envelope in `id`'s mailbox matching `filter`,
    /// preserving the order of everything else. Copies the payload into an
    /// owned [`Message`] and returns both pool slots immediately.
    pub(crate) fn pop_matching(&mut self, id: ActorId, filter: &MatchFilter) -> Option<Message> {
        let mut prev: Option<u16> = None;
        let mut cur = self.actors.get(id)?.mbox_head;

        while let Some(slot) = cur {
            let (sender, header_raw, next) = {
                let env = self.envelopes.get(slot)?;
                (env.sender, env.header, env.next)
            };
            let header = Header::decode(header_raw).ok()?;
            if !filter.matches(sender, header) {
                prev = cur;
                cur = next;
                continue;
            }

            // Unlink `slot` from the chain.
            match prev {
                None => {
                    if let Some(cell) = self.actors.get_mut(id) {
                        cell.mbox_head = next;
                        if next.is_none() {
                            cell.mbox_tail = None;
                        }
                    }
                }
                Some(p) => {
                    if let Some(env) = self.envelopes.get_mut(p) {
                        env.next = next;
                    }
                    if next.is_none() {
                        if let Some(cell) = self.actors.get_mut(id) {
                            cell.mbox_tail = Some(p);
                        }
                    }
                }
            }
            if let Some(cell) = self.actors.get_mut(id) {
                cell.mbox_len -= 1;
            }

            let env = self.envelopes.release(slot)?;
            let message = match env.payload {
                Some(p) => {
                    let message = self
                        .payloads
                        .get(p)
                        .map(|buf| Message::from_parts(sender, header, payload_data(buf, env.len)));
                    self.payloads.release(p);
                    message.unwrap_or_else(|| Message::from_parts(sender, header, &[]))
                }
                None => Message::from_parts(sender, header, &[]),
            };
            return Some(message);
        }
        None
    }

    /// Return a whole envelope chain (a drained mailbox) to the pools.
    pub(crate) fn release_envelope_chain(&mut self, head: Option<u16>) {
        let mut cur = head;
        while let Some(slot) = cur {
            match self.envelopes.release(slot) {
                Some(env) => {
                    if let Some(p) = env.payload {
                        self.payloads.release(p);
                    }
                    cur = env.next;
                }
                None => break,
            }
        }
    }
}

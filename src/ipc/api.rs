//! Send and receive operations.
//!
//! Senders never block. Receivers share one suspension discipline: probe the
//! mailbox, then either return, fail with `WouldBlock` (immediate timeout),
//! or park until a matching delivery, the deadline, or peer death.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use super::header::{Header, MessageClass, TAG_MASK};
use super::message::{MatchFilter, Message};
use crate::error::{RtError, RtResult};
use crate::runtime::context::with_rt;
use crate::sched::scheduler::schedule_out;
use crate::util::ActorId;
use crate::wait::{Timeout, WaitReason, WakeStatus};

/// Send a notification with tag 0. Never blocks.
///
/// Fails with `Invalid` for a malformed handle or oversized payload,
/// `Closed` for a dead peer, and `NoMem` when the envelope or payload pool
/// is exhausted. Self-send is allowed and cannot deadlock: the message
/// simply queues until the sender's next receive.
pub fn notify(to: ActorId, data: &[u8]) -> RtResult<()> {
    notify_tagged(to, 0, data)
}

/// Send a notification carrying a user tag (27 bits) for selective receive.
pub fn notify_tagged(to: ActorId, tag: u32, data: &[u8]) -> RtResult<()> {
    if tag & !TAG_MASK != 0 {
        return Err(RtError::Invalid("user tag exceeds 27 bits"));
    }
    with_rt(|rt| {
        let sender = rt.current_id().unwrap_or(ActorId::INVALID);
        rt.deliver(to, sender, Header::new(MessageClass::Notify, tag), data)
    })
}

/// Receive the next message.
///
/// With `Timeout::Immediate` an empty mailbox yields `WouldBlock`; with a
/// finite timeout an unsatisfied wait yields `Timeout` once the deadline
/// passes.
pub fn recv(timeout: Timeout) -> RtResult<Message> {
    wait_for_message(WaitReason::RecvAny, timeout)
}

/// Receive the first message matching `filter`, leaving the rest of the
/// mailbox in order. O(n) in mailbox depth.
pub fn recv_match(filter: MatchFilter, timeout: Timeout) -> RtResult<Message> {
    wait_for_message(WaitReason::RecvMatch(filter), timeout)
}

/// Send a request and wait for its correlated reply.
///
/// A fresh generated tag correlates the reply; if `to` dies before
/// replying, the call fails with `Closed` promptly instead of waiting for
/// the timeout.
pub fn request(to: ActorId, data: &[u8], timeout: Timeout) -> RtResult<Message> {
    let tag = with_rt(|rt| {
        let sender = rt.current_id()?;
        let tag = rt.next_generated_tag();
        rt.deliver(to, sender, Header::generated(MessageClass::Request, tag), data)?;
        Ok(tag)
    })?;
    wait_for_message(WaitReason::ReplyWait { from: to, tag }, timeout)
}

/// Answer a request, echoing its correlation tag back to the sender.
/// Never blocks. Fails with `Invalid` if `request` is not a Request-class
/// message and with `Closed` if the requester has died.
pub fn reply(request: &Message, data: &[u8]) -> RtResult<()> {
    if request.class() != MessageClass::Request {
        return Err(RtError::Invalid("not a request message"));
    }
    let header = Header {
        class: MessageClass::Reply,
        generated: request.header().generated,
        tag: request.tag(),
    };
    with_rt(|rt| {
        let sender = rt.current_id().unwrap_or(ActorId::INVALID);
        rt.deliver(request.sender(), sender, header, data)
    })
}

/// Whether the current actor's mailbox holds any message.
pub fn pending() -> RtResult<bool> {
    count().map(|n| n > 0)
}

/// Number of messages queued for the current actor.
pub fn count() -> RtResult<usize> {
    with_rt(|rt| {
        let id = rt.current_id()?;
        Ok(rt.actors.get(id).map_or(0, |cell| cell.mbox_len))
    })
}

enum Step {
    Got(Box<Message>),
    WouldBlock,
    Armed,
}

/// Shared receive path: probe, then arm-and-park, then collect.
pub(crate) fn wait_for_message(reason: WaitReason, timeout: Timeout) -> RtResult<Message> {
    let filter = reason
        .pop_filter()
        .ok_or(RtError::Invalid("not a message wait"))?;

    let step = with_rt(|rt| {
        let id = rt.current_id()?;
        if let Some(message) = rt.pop_matching(id, &filter) {
            return Ok(Step::Got(Box::new(message)));
        }
        match timeout.deadline_from(rt.now_micros()) {
            None => Ok(Step::WouldBlock),
            Some(deadline) => {
                rt.arm_wait(id, reason, deadline);
                Ok(Step::Armed)
            }
        }
    })?;

    match step {
        Step::Got(message) => Ok(*message),
        Step::WouldBlock => Err(RtError::WouldBlock),
        Step::Armed => {
            schedule_out();
            with_rt(|rt| {
                let id = rt.current_id()?;
                match rt.take_wake(id) {
                    // The waking delivery is still queued; a lost race here
                    // would be a runtime bug, surfaced as Closed.
                    WakeStatus::Ok => rt.pop_matching(id, &filter).ok_or(RtError::Closed),
                    WakeStatus::Timeout => Err(RtError::Timeout),
                    WakeStatus::Closed => Err(RtError::Closed),
                }
            })
        }
    }
}

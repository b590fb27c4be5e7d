//! Timer operations.

// Layer 1: Standard library imports
use std::time::Duration;

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use crate::error::{RtError, RtResult};
use crate::ipc::api::wait_for_message;
use crate::ipc::{Message, MessageClass};
use crate::runtime::context::with_rt;
use crate::util::TimerId;
use crate::wait::{Timeout, WaitReason};

fn to_micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

/// Register a one-shot timer for the current actor.
///
/// On expiry the runtime posts an empty Timer-class message whose tag is the
/// timer handle. A zero delay fires on the next scheduler iteration.
pub fn after(delay: Duration) -> RtResult<TimerId> {
    with_rt(|rt| {
        let owner = rt.current_id()?;
        let deadline = rt.now_micros().saturating_add(to_micros(delay));
        rt.timers.create(owner, deadline, 0)
    })
}

/// Register a periodic timer for the current actor.
///
/// Ticks are scheduled drift-free at `start + k * period`. A zero period is
/// rejected as `Invalid`.
pub fn every(period: Duration) -> RtResult<TimerId> {
    if period.is_zero() {
        return Err(RtError::Invalid("zero-period periodic timer"));
    }
    with_rt(|rt| {
        let owner = rt.current_id()?;
        let period_us = to_micros(period);
        let deadline = rt.now_micros().saturating_add(period_us);
        rt.timers.create(owner, deadline, period_us)
    })
}

/// Cancel a pending timer.
///
/// Ticks already queued in the owner's mailbox are not retracted; receivers
/// seeing a tick for a cancelled timer should ignore it. A stale handle is
/// an argument error.
pub fn cancel(timer: TimerId) -> RtResult<()> {
    with_rt(|rt| rt.timers.cancel(timer))
}

/// Block the current actor for `duration`, consuming the tick internally.
pub fn sleep(duration: Duration) -> RtResult<()> {
    let timer = after(duration)?;
    wait_for_message(WaitReason::TimerTick(timer), Timeout::Infinite).map(|_| ())
}

/// Whether a received message is a timer tick.
pub fn is_timer(message: &Message) -> bool {
    message.class() == MessageClass::Timer
}

/// The timer handle carried by a tick message, if it is one.
pub fn tick_timer(message: &Message) -> Option<TimerId> {
    if is_timer(message) {
        Some(TimerId::from_raw(message.tag()))
    } else {
        None
    }
}

//! The blocking discipline shared by receive, request, timer waits, and I/O
//! waits.
//!
//! Every blocking operation follows one shape: record a [`WaitReason`] and an
//! absolute deadline on the caller's control block, transition to Suspended,
//! and switch to the scheduler. A wakeup source (matching message delivery,
//! readiness drain, or deadline expiry) writes a [`WakeStatus`] and moves the
//! actor to the back of its priority queue; on its next dispatch the blocking
//! call reads the status and returns.

// Layer 1: Standard library imports
use std::time::Duration;

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use crate::actor::cell::ActorState;
use crate::io::IoToken;
use crate::ipc::MatchFilter;
use crate::runtime::context::Runtime;
use crate::util::{ActorId, TimerId};

/// Absolute-deadline encoding for "no deadline".
pub(crate) const INFINITE_DEADLINE: u64 = u64::MAX;

/// How long a blocking operation may wait.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use filament_rt::Timeout;
///
/// let probe = Timeout::Immediate;        // never suspend
/// let bounded = Timeout::after_millis(50);
/// let forever = Timeout::Infinite;
/// assert_eq!(bounded, Timeout::After(Duration::from_millis(50)));
/// assert_ne!(probe, forever);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    /// Do not suspend; if the operation cannot complete now, return
    /// `WouldBlock`.
    Immediate,
    /// Wait without a deadline.
    Infinite,
    /// Wait until `now + duration`, then wake with `Timeout`.
    After(Duration),
}

impl Timeout {
    /// Convenience constructor for millisecond timeouts.
    pub fn after_millis(ms: u64) -> Self {
        Timeout::After(Duration::from_millis(ms))
    }

    /// Absolute deadline in runtime micros, or `None` for `Immediate`.
    pub(crate) fn deadline_from(self, now: u64) -> Option<u64> {
        match self {
            Timeout::Immediate => None,
            Timeout::Infinite => Some(INFINITE_DEADLINE),
            Timeout::After(d) => {
                let micros = u64::try_from(d.as_micros()).unwrap_or(INFINITE_DEADLINE);
                Some(now.saturating_add(micros))
            }
        }
    }
}

/// Why a suspended actor is waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WaitReason {
    /// Any mailbox delivery.
    RecvAny,
    /// A mailbox delivery matching the filter.
    RecvMatch(MatchFilter),
    /// A reply correlated to a generated request tag.
    ReplyWait { from: ActorId, tag: u32 },
    /// The tick of one specific timer.
    TimerTick(TimerId),
    /// Readiness of one I/O wait token.
    IoReady(IoToken),
}

impl WaitReason {
    /// The mailbox filter that satisfies this reason, if the reason is
    /// satisfied by message delivery at all.
    pub fn pop_filter(&self) -> Option<MatchFilter> {
        use crate::ipc::MessageClass;
        match *self {
            WaitReason::RecvAny => Some(MatchFilter::any()),
            WaitReason::RecvMatch(filter) => Some(filter),
            WaitReason::ReplyWait { from, tag } => Some(
                MatchFilter::any()
                    .with_sender(from)
                    .with_class(MessageClass::Reply)
                    .with_tag(tag),
            ),
            WaitReason::TimerTick(id) => Some(
                MatchFilter::any()
                    .with_class(MessageClass::Timer)
                    .with_tag(id.as_u32()),
            ),
            WaitReason::IoReady(_) => None,
        }
    }
}

/// Result written by the wakeup source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WakeStatus {
    /// The wait reason was satisfied.
    Ok,
    /// The deadline elapsed first.
    Timeout,
    /// The awaited peer (or file descriptor) is gone.
    Closed,
}

impl Runtime {
    /// Park the current actor with a reason and absolute deadline. The
    /// caller must switch to the scheduler afterwards.
    pub(crate) fn arm_wait(&mut self, id: ActorId, reason: WaitReason, deadline: u64) {
        if let Some(cell) = self.actors.get_mut(id) {
            cell.wait = Some(reason);
            cell.deadline = deadline;
            cell.wake = None;
            cell.state = ActorState::Suspended;
        }
    }

    /// Wake a suspended actor with a status, clearing its wait state and
    /// queueing it at the back of its priority level. No-op unless the actor
    /// is currently Suspended, so racing wake sources cannot double-enqueue.
    pub(crate) fn wake_actor(&mut self, id: ActorId, status: WakeStatus) {
        let Some(cell) = self.actors.get_mut(id) else {
            return;
        };
        if cell.state != ActorState::Suspended {
            return;
        }
        cell.wait = None;
        cell.deadline = INFINITE_DEADLINE;
        cell.wake = Some(status);
        cell.state = ActorState::Runnable;
        let priority = cell.priority;
        self.ready.push(priority, id);
    }

    /// Read and clear the wake status after a resume. Defaults to `Ok` for
    /// robustness if a source forgot to write one.
    pub(crate) fn take_wake(&mut self, id: ActorId) -> WakeStatus {
        self.actors
            .get_mut(id)
            .and_then(|cell| cell.wake.take())
            .unwrap_or(WakeStatus::Ok)
    }

    /// Wake every suspended actor whose deadline has passed.
    pub(crate) fn wake_expired(&mut self, now: u64) {
        let due: Vec<ActorId> = self
            .actors
            .ids()
            .into_iter()
            .filter(|&id| {
                self.actors
                    .get(id)
                    .is_some_and(|cell| cell.is_suspended() && cell.deadline <= now)
            })
            .collect();
        for id in due {
            self.wake_actor(id, WakeStatus::Timeout);
        }
    }

    /// Earliest suspension deadline across all parked actors, if any actor
    /// has a finite deadline.
    pub(crate) fn next_wait_deadline(&self) -> Option<u64> {
        self.actors
            .ids()
            .into_iter()
            .filter_map(|id| self.actors.get(id))
            .filter(|cell| cell.is_suspended() && cell.deadline != INFINITE_DEADLINE)
            .map(|cell| cell.deadline)
            .min()
    }
}

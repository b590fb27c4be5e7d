//! Readiness contract for I/O collaborators.
//!
//! The core knows nothing about file descriptors or sockets. An adapter
//! (file, network, whatever) registers a [`ReadinessSource`]; each blocking
//! I/O call registers an opaque wait token with its source and parks the
//! calling actor via [`wait`]. Between dispatches, the run loop polls the
//! source and translates ready tokens into wakeups, which makes every
//! blocking I/O primitive cooperative without the core learning its details.

// Layer 1: Standard library imports
use std::fmt::Debug;
use std::time::Duration;

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use crate::error::{RtError, RtResult};
use crate::runtime::context::{with_rt, Runtime};
use crate::sched::scheduler::schedule_out;
use crate::wait::{Timeout, WaitReason, WakeStatus};

/// Opaque wait token chosen by the I/O adapter; typically encodes a file
/// descriptor and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IoToken(pub u64);

/// What a polled token reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// The token's operation can proceed; the waiter wakes with success.
    Ready,
    /// The underlying descriptor is gone; the waiter wakes with `Closed`.
    Closed,
}

/// One readiness notification from a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadyEvent {
    /// Token passed to [`wait`] by the parked actor.
    pub token: IoToken,
    /// Outcome for that token.
    pub readiness: Readiness,
}

/// A pollable producer of readiness events, registered once per runtime.
///
/// `poll` may block up to `timeout` and appends events to `events`. Sources
/// must tolerate tokens nobody waits on anymore (a waiter may have timed out
/// first); the runtime ignores such events.
pub trait ReadinessSource: Debug {
    /// Poll for readiness, blocking at most `timeout`.
    fn poll(&mut self, timeout: Duration, events: &mut Vec<ReadyEvent>) -> RtResult<()>;
}

/// Register the runtime's readiness source. Replaces any previous source.
pub fn register_source(source: Box<dyn ReadinessSource>) -> RtResult<()> {
    with_rt(|rt| {
        rt.io_source = Some(source);
        Ok(())
    })
}

/// Park the current actor until `token` becomes ready.
///
/// Returns `Ok` on readiness, `Timeout` when the deadline elapses first,
/// `Closed` when the source reports the descriptor gone, and `WouldBlock`
/// for `Timeout::Immediate` (an I/O wait cannot complete without parking).
pub fn wait(token: IoToken, timeout: Timeout) -> RtResult<()> {
    let armed = with_rt(|rt| {
        let id = rt.current_id()?;
        match timeout.deadline_from(rt.now_micros()) {
            None => Ok(false),
            Some(deadline) => {
                rt.arm_wait(id, WaitReason::IoReady(token), deadline);
                Ok(true)
            }
        }
    })?;
    if !armed {
        return Err(RtError::WouldBlock);
    }
    schedule_out();
    with_rt(|rt| {
        let id = rt.current_id()?;
        match rt.take_wake(id) {
            WakeStatus::Ok => Ok(()),
            WakeStatus::Timeout => Err(RtError::Timeout),
            WakeStatus::Closed => Err(RtError::Closed),
        }
    })
}

impl Runtime {
    /// Poll the registered source (if any) and wake matching waiters.
    /// Returns whether any actor became runnable.
    pub(crate) fn drain_io(&mut self, timeout: Duration) -> bool {
        let Some(mut source) = self.io_source.take() else {
            return false;
        };
        let mut events = std::mem::take(&mut self.io_events);
        events.clear();
        let poll_result = source.poll(timeout, &mut events);
        self.io_source = Some(source);

        let cap = self.config.max_ready_events_per_tick;
        if events.len() > cap {
            events.truncate(cap);
        }

        let mut woke = false;
        if poll_result.is_ok() {
            for event in &events {
                let waiter = self.actors.ids().into_iter().find(|&id| {
                    self.actors.get(id).is_some_and(|cell| {
                        cell.is_suspended() && cell.wait == Some(WaitReason::IoReady(event.token))
                    })
                });
                if let Some(id) = waiter {
                    let status = match event.readiness {
                        Readiness::Ready => WakeStatus::Ok,
                        Readiness::Closed => WakeStatus::Closed,
                    };
                    self.wake_actor(id, status);
                    woke = true;
                }
            }
        }
        self.io_events = events;
        woke
    }
}

//! Runtime lifecycle and the dispatch loop.
//!
//! The loop alternates four activities until quiescence: dispatch the next
//! runnable actor; on empty run queues expire due timers into mailboxes;
//! drain readiness from the registered I/O source; and wake deadline-expired
//! waiters. `run` returns when no live actor remains, when `shutdown` was
//! requested, or when the remaining actors can provably never be woken.

// Layer 1: Standard library imports
use std::time::Duration;

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use crate::actor::cell::{ActorState, ExitReason};
use crate::error::{RtError, RtResult};
use crate::monitoring::RuntimeEventKind;
use crate::runtime::config::RuntimeConfig;
use crate::runtime::context::{self, with_rt, Runtime};
use crate::sched::scheduler::dispatch;
use crate::wait::{WakeStatus, INFINITE_DEADLINE};

/// Initialise the runtime on this thread.
///
/// Allocates every pool and the stack arena up front. Fails with `Invalid`
/// if the configuration is rejected or a runtime is already installed.
pub fn init(config: RuntimeConfig) -> RtResult<()> {
    config.validate()?;
    context::install(Box::new(Runtime::new(config)))
}

/// Request loop termination. The current iteration finishes its dispatch;
/// surviving actors are torn down by [`cleanup`].
pub fn shutdown() -> RtResult<()> {
    with_rt(|rt| {
        rt.quit = true;
        Ok(())
    })
}

enum LoopStep {
    Dispatch(crate::util::ActorId),
    Poll(Duration),
    Sleep(Duration),
    Quiescent,
    Deadlock(usize),
    Quit,
}

/// Drive the runtime until quiescence.
///
/// Must be called from the embedding thread, not from an actor.
pub fn run() -> RtResult<()> {
    with_rt(|rt| {
        if rt.current.is_some() {
            return Err(RtError::Invalid("run() called from an actor"));
        }
        rt.emit(RuntimeEventKind::RuntimeStarted);
        Ok(())
    })?;

    loop {
        let step = with_rt(|rt| {
            if rt.quit {
                return Ok(LoopStep::Quit);
            }
            rt.expire_timers();
            let now = rt.now_micros();
            rt.wake_expired(now);

            if let Some(id) = rt.pick_next() {
                return Ok(LoopStep::Dispatch(id));
            }
            if rt.actors.len() == 0 {
                return Ok(LoopStep::Quiescent);
            }

            // Everyone is parked. Figure out what can wake them.
            let next_deadline = match (rt.timers.next_deadline(), rt.next_wait_deadline()) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (Some(a), None) => Some(a),
                (None, Some(b)) => Some(b),
                (None, None) => None,
            };
            let until_deadline = next_deadline
                .filter(|&d| d != INFINITE_DEADLINE)
                .map(|d| Duration::from_micros(d.saturating_sub(now)));

            if rt.io_source.is_some() {
                let poll_for = match until_deadline {
                    Some(d) => d.min(rt.config.io_poll_timeout),
                    None => rt.config.io_poll_timeout,
                };
                return Ok(LoopStep::Poll(poll_for));
            }
            match until_deadline {
                Some(d) => Ok(LoopStep::Sleep(d)),
                None => Ok(LoopStep::Deadlock(rt.actors.len())),
            }
        })?;

        match step {
            LoopStep::Dispatch(id) => dispatch(id),
            LoopStep::Poll(timeout) => {
                let _ = with_rt(|rt| Ok(rt.drain_io(timeout)));
            }
            LoopStep::Sleep(duration) => {
                if !duration.is_zero() {
                    std::thread::sleep(duration);
                }
            }
            LoopStep::Quiescent | LoopStep::Quit => {
                return with_rt(|rt| {
                    rt.emit(RuntimeEventKind::RuntimeStopped);
                    Ok(())
                });
            }
            LoopStep::Deadlock(suspended) => {
                return with_rt(|rt| {
                    rt.emit(RuntimeEventKind::DeadlockDetected { suspended });
                    rt.emit(RuntimeEventKind::RuntimeStopped);
                    Ok(())
                });
            }
        }
    }
}

/// Tear the runtime down.
///
/// Surviving actors are killed: each is resumed once with a kill flag set,
/// unwinds through its frames (running destructors), and goes through the
/// normal cleanup epilogue with reason `Killed`. Pools and the arena are
/// then released.
pub fn cleanup() -> RtResult<()> {
    with_rt(|rt| {
        if rt.current.is_some() {
            return Err(RtError::Invalid("cleanup() called from an actor"));
        }
        for id in rt.actors.ids() {
            if let Some(cell) = rt.actors.get_mut(id) {
                cell.kill_pending = true;
            }
            // Suspended actors must resume to unwind; wake_actor is a no-op
            // for already-runnable ones.
            rt.wake_actor(id, WakeStatus::Closed);
        }
        Ok(())
    })?;

    loop {
        let next = with_rt(|rt| Ok(rt.pick_next()))?;
        match next {
            Some(id) => dispatch(id),
            None => break,
        }
    }

    // Anything still present never reached a resume point; reclaim it
    // directly through the epilogue.
    with_rt(|rt| {
        for id in rt.actors.ids() {
            if let Some(cell) = rt.actors.get_mut(id) {
                cell.state = ActorState::Dead;
                cell.exit_reason.get_or_insert(ExitReason::Killed);
            }
            rt.cleanup_dead(id);
        }
        Ok(())
    })?;

    match context::uninstall() {
        Some(runtime) => {
            drop(runtime);
            Ok(())
        }
        None => Err(RtError::Invalid("runtime not initialized")),
    }
}

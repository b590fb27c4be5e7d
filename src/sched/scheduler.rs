//! Dispatch, the actor trampoline, and the cleanup epilogue.
//!
//! All context switches funnel through two helpers here: `dispatch` (the run
//! loop entering an actor) and `switch_to_scheduler` (an actor leaving).
//! Both take raw context pointers inside a short runtime borrow and switch
//! after the borrow is released; the pointers stay valid because the runtime
//! is boxed and pool slots never move.

// Layer 1: Standard library imports
use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use crate::actor::cell::{ActorState, ExitReason, ExitSignal};
use crate::fiber::{fiber_switch, FiberContext};
use crate::monitoring::RuntimeEventKind;
use crate::runtime::context::{with_rt, Runtime};
use crate::util::ActorId;
use crate::wait::{WaitReason, WakeStatus};

impl Runtime {
    /// Pop ready queues until a live, runnable actor surfaces. Stale entries
    /// (recycled handles, no-longer-runnable actors) are discarded.
    pub(crate) fn pick_next(&mut self) -> Option<ActorId> {
        loop {
            let id = self.ready.pop_highest()?;
            if self
                .actors
                .get(id)
                .is_some_and(|cell| cell.state == ActorState::Runnable)
            {
                return Some(id);
            }
        }
    }

    /// The cleanup epilogue, run on the scheduler side once an actor is
    /// Dead. Order matters: request waiters first, then supervision
    /// notifications, then resource teardown, and the generation bump last
    /// so the handle stays resolvable while exit messages are addressed
    /// from it.
    pub(crate) fn cleanup_dead(&mut self, id: ActorId) {
        let reason = self
            .actors
            .get(id)
            .and_then(|cell| cell.exit_reason)
            .unwrap_or(ExitReason::Killed);

        // Waiters blocked in a request against this actor get Closed now
        // rather than at their timeout.
        let waiters: Vec<ActorId> = self
            .actors
            .ids()
            .into_iter()
            .filter(|&waiter| {
                self.actors.get(waiter).is_some_and(|cell| {
                    cell.is_suspended()
                        && matches!(cell.wait, Some(WaitReason::ReplyWait { from, .. }) if from == id)
                })
            })
            .collect();
        for waiter in waiters {
            self.wake_actor(waiter, WakeStatus::Closed);
        }

        self.notify_links(id, reason);
        self.notify_watchers(id, reason);
        self.drop_held_monitors(id);
        self.timers.cancel_owned(id);

        let head = self.actors.get_mut(id).and_then(|cell| {
            let head = cell.mbox_head.take();
            cell.mbox_tail = None;
            cell.mbox_len = 0;
            head
        });
        self.release_envelope_chain(head);

        if let Some(mut cell) = self.actors.remove(id) {
            if let Some(stack) = cell.stack.take() {
                stack.release(&mut self.arena);
            }
        }
        self.emit(RuntimeEventKind::ActorExited { actor: id, reason });
    }
}

/// Switch from the scheduler into an actor, then handle whatever state it
/// left behind: verify the stack sentinel, and run the cleanup epilogue if
/// the actor died.
pub(crate) fn dispatch(id: ActorId) {
    let pointers = with_rt(|rt| {
        let Some(cell) = rt.actors.get_mut(id) else {
            return Ok(None);
        };
        let to: *const FiberContext = &cell.ctx;
        let from: *mut FiberContext = &mut rt.sched_ctx;
        rt.current = Some(id);
        Ok(Some((from, to)))
    })
    .ok()
    .flatten();
    let Some((from, to)) = pointers else {
        return;
    };

    // Safety: both contexts live inside the boxed runtime; the actor context
    // was bootstrapped at spawn or saved by its last switch-out, and no
    // runtime borrow is held across the switch.
    unsafe { fiber_switch(from, to) };

    let dead = with_rt(|rt| {
        rt.current = None;
        let tripped = rt
            .actors
            .get(id)
            .and_then(|cell| cell.stack.as_ref())
            .is_some_and(|stack| !stack.sentinel_intact());
        if tripped {
            rt.emit(RuntimeEventKind::StackGuardTripped { actor: id });
            if let Some(cell) = rt.actors.get_mut(id) {
                cell.state = ActorState::Dead;
                cell.exit_reason = Some(ExitReason::CrashStack);
            }
        }
        Ok(rt
            .actors
            .get(id)
            .is_some_and(|cell| cell.state == ActorState::Dead))
    })
    .unwrap_or(false);

    if dead {
        let _ = with_rt(|rt| {
            rt.cleanup_dead(id);
            Ok(())
        });
    }
}

/// Switch from the current actor back to the scheduler. Plain transfer; the
/// caller has already recorded why (yield, suspension, or death).
fn switch_to_scheduler() {
    let pointers = with_rt(|rt| {
        let id = rt.current_id()?;
        let to: *const FiberContext = &rt.sched_ctx;
        match rt.actors.get_mut(id) {
            Some(cell) => {
                let from: *mut FiberContext = &mut cell.ctx;
                Ok(Some((from, to)))
            }
            None => Ok(None),
        }
    })
    .ok()
    .flatten();
    if let Some((from, to)) = pointers {
        // Safety: as in `dispatch`; the scheduler context was saved when the
        // run loop last dispatched.
        unsafe { fiber_switch(from, to) };
    }
}

/// Leave the current actor and, on resume, honor a pending kill by
/// unwinding to the trampoline so destructors on the actor stack run.
pub(crate) fn schedule_out() {
    switch_to_scheduler();
    let kill = with_rt(|rt| {
        let id = rt.current_id()?;
        Ok(rt.actors.get(id).is_some_and(|cell| cell.kill_pending))
    })
    .unwrap_or(false);
    if kill {
        resume_unwind(Box::new(ExitSignal(ExitReason::Killed)));
    }
}

/// Mark the current actor Dead with `reason` and switch away forever.
pub(crate) fn finish_current(reason: ExitReason) -> ! {
    let _ = with_rt(|rt| {
        if let Some(id) = rt.current {
            if let Some(cell) = rt.actors.get_mut(id) {
                cell.state = ActorState::Dead;
                if cell.exit_reason.is_none() {
                    cell.exit_reason = Some(reason);
                }
            }
        }
        Ok(())
    });
    switch_to_scheduler();
    unreachable!("dead actor was dispatched again");
}

/// First frame of every actor fiber. Runs the entry closure under
/// `catch_unwind` so that `exit` (an [`ExitSignal`] unwind) and panics both
/// terminate the actor cleanly: a plain return is a crash by contract, an
/// exit signal carries its reason, any other panic is a crash.
pub(crate) extern "C" fn actor_trampoline() -> ! {
    let entry = with_rt(|rt| {
        let id = rt.current_id()?;
        match rt.actors.get_mut(id) {
            Some(cell) if cell.kill_pending => Ok(None),
            Some(cell) => Ok(cell.entry.take()),
            None => Ok(None),
        }
    });

    let reason = match entry {
        Ok(Some(f)) => match catch_unwind(AssertUnwindSafe(f)) {
            Ok(()) => ExitReason::Crash,
            Err(payload) => match payload.downcast::<ExitSignal>() {
                Ok(signal) => signal.0,
                Err(_) => ExitReason::Crash,
            },
        },
        // Killed before first dispatch, or the runtime vanished under us.
        _ => ExitReason::Killed,
    };
    finish_current(reason)
}

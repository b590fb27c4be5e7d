//! Actor lifecycle operations.

// Layer 1: Standard library imports
use std::panic::resume_unwind;

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use super::cell::{ActorCell, ExitReason, ExitSignal};
use super::config::SpawnConfig;
use crate::error::{RtError, RtResult};
use crate::fiber::FiberContext;
use crate::monitoring::RuntimeEventKind;
use crate::runtime::config::MIN_STACK_SIZE;
use crate::runtime::context::{with_rt, Runtime};
use crate::sched::scheduler::{actor_trampoline, schedule_out};
use crate::stack::{StackInfo, StackSegment};
use crate::util::ActorId;

/// Spawn an actor with default configuration.
///
/// The new actor is enqueued at the back of its priority level and first
/// runs at a later scheduler decision. Works from actors and from the
/// embedding thread (before or during `run`).
///
/// # Examples
///
/// ```rust
/// use filament_rt::{self as rt, RuntimeConfig};
///
/// rt::init(RuntimeConfig::default()).unwrap();
/// rt::spawn(|| {
///     // actor body; returning without rt::exit() counts as a crash
///     rt::exit();
/// })
/// .unwrap();
/// rt::run().unwrap();
/// rt::cleanup().unwrap();
/// ```
pub fn spawn(entry: impl FnOnce() + 'static) -> RtResult<ActorId> {
    spawn_ex(SpawnConfig::default(), entry)
}

/// Spawn an actor with explicit configuration.
pub fn spawn_ex(config: SpawnConfig, entry: impl FnOnce() + 'static) -> RtResult<ActorId> {
    with_rt(|rt| rt.spawn_inner(config, Box::new(entry)))
}

/// Terminate the current actor with reason `Normal`. Never returns; the
/// actor's stack unwinds so locals are dropped, then the scheduler runs the
/// cleanup epilogue.
///
/// # Panics
/// Panics if called outside an actor.
pub fn exit() -> ! {
    let inside = with_rt(|rt| rt.current_id()).is_ok();
    assert!(inside, "exit() called outside an actor");
    resume_unwind(Box::new(ExitSignal(ExitReason::Normal)))
}

/// Yield the processor: requeue the current actor at the back of its
/// priority level and let the scheduler pick the next runnable actor.
pub fn yield_now() -> RtResult<()> {
    with_rt(|rt| {
        let id = rt.current_id()?;
        let priority = rt
            .actors
            .get(id)
            .map(|cell| cell.priority)
            .unwrap_or_default();
        rt.ready.push(priority, id);
        Ok(())
    })?;
    schedule_out();
    Ok(())
}

/// Handle of the calling actor, or [`ActorId::INVALID`] off-actor.
pub fn current() -> ActorId {
    with_rt(|rt| Ok(rt.current_id().unwrap_or(ActorId::INVALID))).unwrap_or(ActorId::INVALID)
}

/// Whether `id` names a live actor. Stale handles (recycled slots) report
/// `false`.
pub fn alive(id: ActorId) -> bool {
    with_rt(|rt| Ok(rt.actors.is_alive(id))).unwrap_or(false)
}

/// Stack bounds of the calling actor, for diagnostics.
pub fn stack_info() -> RtResult<StackInfo> {
    with_rt(|rt| {
        let id = rt.current_id()?;
        rt.actors
            .get(id)
            .and_then(|cell| cell.stack.as_ref())
            .map(|stack| stack.info())
            .ok_or(RtError::Invalid("no stack"))
    })
}

/// Number of live actors.
pub fn actor_count() -> usize {
    with_rt(|rt| Ok(rt.actors.len())).unwrap_or(0)
}

impl Runtime {
    pub(crate) fn spawn_inner(
        &mut self,
        config: SpawnConfig,
        entry: Box<dyn FnOnce()>,
    ) -> RtResult<ActorId> {
        let stack_size = if config.stack_size == 0 {
            self.config.default_stack_size
        } else {
            config.stack_size
        };
        if stack_size < MIN_STACK_SIZE {
            return Err(RtError::Invalid("stack size below minimum"));
        }
        // Check table capacity before carving the stack so a full table
        // cannot leak a stack segment.
        if self.actors.len() >= self.config.max_actors {
            return Err(RtError::NoMem("actor table"));
        }

        let stack = StackSegment::allocate(&mut self.arena, stack_size, config.heap_stack)
            .ok_or(RtError::NoMem("stack memory"))?;
        // Safety: the segment is live, 16-aligned, exclusively owned by this
        // actor, and comfortably larger than the bootstrap frame.
        let ctx = unsafe { FiberContext::bootstrap(stack.high(), actor_trampoline) };

        let name = config.name.clone();
        let cell = ActorCell::new(name.clone(), config.priority, stack, ctx, entry);
        let id = self.actors.insert(cell)?;
        self.ready.push(config.priority, id);
        self.emit(RuntimeEventKind::ActorSpawned {
            actor: id,
            priority: config.priority,
            name,
        });
        Ok(id)
    }
}

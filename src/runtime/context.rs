//! The runtime context and its thread-local singleton.
//!
//! All core state is owned by one [`Runtime`] value living in a thread-local
//! slot, initialised by `init` and torn down by `cleanup`. Operations borrow
//! it for short critical sections through [`with_rt`]; context switches
//! always happen outside any borrow, against raw pointers into the boxed
//! (and therefore address-stable) runtime.

// Layer 1: Standard library imports
use std::cell::RefCell;
use std::time::Instant;

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use crate::actor::table::ActorTable;
use crate::error::{RtError, RtResult};
use crate::fiber::FiberContext;
use crate::io::{ReadinessSource, ReadyEvent};
use crate::ipc::envelope::{Envelope, PayloadSlot};
use crate::ipc::TAG_MASK;
use crate::monitoring::{NoopMonitor, RuntimeEvent, RuntimeEventKind, RuntimeMonitor};
use crate::pool::{PoolStats, SlotPool};
use crate::runtime::config::RuntimeConfig;
use crate::sched::queue::ReadyQueues;
use crate::stack::StackArena;
use crate::supervision::links::LinkEntry;
use crate::supervision::monitors::MonitorEntry;
use crate::timer::service::TimerService;
use crate::util::ActorId;

/// Everything the runtime owns.
pub(crate) struct Runtime {
    pub config: RuntimeConfig,
    pub epoch: Instant,

    pub actors: ActorTable,
    pub ready: ReadyQueues,

    pub envelopes: SlotPool<Envelope>,
    pub payloads: SlotPool<PayloadSlot>,
    pub links: SlotPool<LinkEntry>,
    pub monitors: SlotPool<MonitorEntry>,
    pub timers: TimerService,

    pub arena: StackArena,

    /// Actor currently executing on a fiber stack, if any.
    pub current: Option<ActorId>,
    /// The scheduler's own (OS-thread) context.
    pub sched_ctx: FiberContext,

    pub quit: bool,
    tag_counter: u32,

    pub io_source: Option<Box<dyn ReadinessSource>>,
    pub io_events: Vec<ReadyEvent>,

    pub sink: Box<dyn RuntimeMonitor>,
}

impl Runtime {
    pub fn new(config: RuntimeConfig) -> Self {
        let arena = StackArena::new(config.stack_arena_size);
        Runtime {
            actors: ActorTable::new(config.max_actors),
            ready: ReadyQueues::new(config.max_actors),
            envelopes: SlotPool::new("envelope pool", config.envelope_pool_size),
            payloads: SlotPool::new("payload pool", config.payload_pool_size),
            links: SlotPool::new("link pool", config.link_pool_size),
            monitors: SlotPool::new("monitor pool", config.monitor_pool_size),
            timers: TimerService::new(config.timer_pool_size),
            arena,
            epoch: Instant::now(),
            current: None,
            sched_ctx: FiberContext::root(),
            quit: false,
            tag_counter: 0,
            io_source: None,
            io_events: Vec::new(),
            sink: Box::new(NoopMonitor),
            config,
        }
    }

    /// Monotonic runtime clock in microseconds since init.
    pub fn now_micros(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_micros()).unwrap_or(u64::MAX)
    }

    /// Handle of the actor currently executing, or an argument error for
    /// calls made off-actor (from the embedding thread).
    pub fn current_id(&self) -> RtResult<ActorId> {
        self.current
            .ok_or(RtError::Invalid("not called from an actor"))
    }

    /// Fresh 27-bit correlation tag. Wraps; the generated-flag bit keeps the
    /// space disjoint from user tags, and outstanding requests are far fewer
    /// than the wrap period.
    pub fn next_generated_tag(&mut self) -> u32 {
        self.tag_counter = (self.tag_counter + 1) & TAG_MASK;
        if self.tag_counter == 0 {
            self.tag_counter = 1;
        }
        self.tag_counter
    }

    /// Record a monitoring event.
    pub fn emit(&mut self, kind: RuntimeEventKind) {
        let event = RuntimeEvent::now(kind);
        self.sink.record(&event);
    }
}

thread_local! {
    static RUNTIME: RefCell<Option<Box<Runtime>>> = const { RefCell::new(None) };
}

/// Install a runtime; fails if one is already installed on this thread.
pub(crate) fn install(runtime: Box<Runtime>) -> RtResult<()> {
    RUNTIME.with(|slot| {
        let mut guard = slot.borrow_mut();
        if guard.is_some() {
            return Err(RtError::Invalid("runtime already initialized"));
        }
        *guard = Some(runtime);
        Ok(())
    })
}

/// Remove and return the installed runtime, if any.
pub(crate) fn uninstall() -> Option<Box<Runtime>> {
    RUNTIME.with(|slot| slot.borrow_mut().take())
}

/// Whether a runtime is installed on this thread.
pub(crate) fn is_initialized() -> bool {
    RUNTIME.with(|slot| slot.borrow().is_some())
}

/// Run a short critical section against the runtime.
///
/// The borrow must not be held across a context switch; switch helpers
/// extract raw pointers inside one `with_rt` call and switch after it
/// returns.
pub(crate) fn with_rt<R>(f: impl FnOnce(&mut Runtime) -> RtResult<R>) -> RtResult<R> {
    RUNTIME.with(|slot| {
        let mut guard = slot.borrow_mut();
        match guard.as_mut() {
            Some(rt) => f(rt),
            None => Err(RtError::Invalid("runtime not initialized")),
        }
    })
}

/// Occupancy of every core pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    /// Actor table occupancy.
    pub actors: PoolStats,
    /// Envelope pool occupancy.
    pub envelopes: PoolStats,
    /// Payload pool occupancy.
    pub payloads: PoolStats,
    /// Link pool occupancy.
    pub links: PoolStats,
    /// Monitor pool occupancy.
    pub monitors: PoolStats,
    /// Timer pool occupancy.
    pub timers: PoolStats,
}

/// Snapshot current pool occupancy. Works from actors and from the
/// embedding thread alike.
pub fn pool_snapshot() -> RtResult<PoolSnapshot> {
    with_rt(|rt| {
        Ok(PoolSnapshot {
            actors: rt.actors.stats(),
            envelopes: rt.envelopes.stats(),
            payloads: rt.payloads.stats(),
            links: rt.links.stats(),
            monitors: rt.monitors.stats(),
            timers: rt.timers.stats(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_rt_requires_init() {
        let err = with_rt(|_| Ok(())).unwrap_err();
        assert_eq!(err, RtError::Invalid("runtime not initialized"));
    }

    #[test]
    fn test_install_uninstall_cycle() {
        assert!(!is_initialized());
        install(Box::new(Runtime::new(RuntimeConfig::default()))).unwrap();
        assert!(is_initialized());
        assert!(install(Box::new(Runtime::new(RuntimeConfig::default()))).is_err());
        let rt = uninstall().unwrap();
        drop(rt);
        assert!(!is_initialized());
    }

    #[test]
    fn test_generated_tags_are_nonzero_and_masked() {
        let mut rt = Runtime::new(RuntimeConfig::default());
        let t1 = rt.next_generated_tag();
        let t2 = rt.next_generated_tag();
        assert_ne!(t1, 0);
        assert_ne!(t1, t2);
        assert_eq!(t1 & !TAG_MASK, 0);
    }

    #[test]
    fn test_clock_is_monotonic() {
        let rt = Runtime::new(RuntimeConfig::default());
        let a = rt.now_micros();
        let b = rt.now_micros();
        assert!(b >= a);
    }
}

//! # filament-rt - Cooperative Actor Runtime
//!
//! An embeddable actor runtime for building concurrent, event-driven
//! programs on a single OS thread. Actors are cooperative user-space fibers
//! with private stacks; the runtime routes messages between them through
//! bounded pools, delivers timers as mailbox messages, and exposes a
//! readiness-driven suspension contract that turns blocking-style I/O into
//! cooperative waits.
//!
//! # Quick Start
//!
//! ```rust
//! use filament_rt::{self as rt, RuntimeConfig, Timeout};
//!
//! rt::init(RuntimeConfig::default()).unwrap();
//!
//! let echo = rt::spawn(|| {
//!     // Serve one request, then stop.
//!     let msg = rt::recv(Timeout::Infinite).unwrap();
//!     rt::reply(&msg, msg.data()).unwrap();
//!     rt::exit();
//! })
//! .unwrap();
//!
//! rt::spawn(move || {
//!     let reply = rt::request(echo, b"ping", Timeout::after_millis(100)).unwrap();
//!     assert_eq!(reply.data(), b"ping");
//!     rt::exit();
//! })
//! .unwrap();
//!
//! rt::run().unwrap();
//! rt::cleanup().unwrap();
//! ```
//!
//! # Core Concepts
//!
//! - **Cooperative scheduling**: four strict priority levels, FIFO within a
//!   level, switches only at explicit points (`yield_now`, blocking
//!   receives, `exit`, I/O waits). No preemption, no aging: a busy high
//!   priority starves lower ones by design.
//! - **Pooled messaging**: envelopes and payloads come from fixed pools
//!   sized at [`init`]; exhaustion surfaces as `NoMem` instead of growing
//!   memory.
//! - **Generation-tagged handles**: a recycled actor slot never answers to
//!   a stale [`ActorId`], so late sends fail with `Closed` instead of
//!   reaching the wrong actor.
//! - **Supervision**: bidirectional [`link`]s and unidirectional
//!   [`monitor`]s deliver exit notifications with the dead actor's
//!   [`ExitReason`].
//! - **Stack guards**: every actor stack carries a low-end sentinel word;
//!   an overrun detected at a switch point terminates the actor with
//!   `CrashStack` while the runtime keeps running.
//!
//! # Module Organization
//!
//! - [`actor`] - spawn, exit, yield, and actor introspection
//! - [`ipc`] - mailboxes, selective receive, request/reply
//! - [`timer`] - one-shot and periodic timers, sleep
//! - [`supervision`] - links, monitors, exit decoding
//! - [`io`] - the readiness contract for I/O adapters
//! - [`runtime`] - init/run/cleanup/shutdown and configuration
//! - [`monitoring`] - pluggable runtime event observation
//! - [`pool`], [`stack`], [`fiber`], [`sched`], [`wait`] - the engine room

pub mod actor;
pub mod error;
pub mod fiber;
pub mod io;
pub mod ipc;
pub mod monitoring;
pub mod pool;
pub mod runtime;
pub(crate) mod sched;
pub mod stack;
pub mod supervision;
pub mod timer;
pub mod util;
pub mod wait;

// Re-export the operation surface at the crate root.
pub use actor::{
    actor_count, alive, current, exit, spawn, spawn_ex, yield_now, ExitReason, Priority,
    SpawnConfig,
};
pub use actor::api::stack_info;
pub use error::{RtError, RtResult};
pub use io::{IoToken, Readiness, ReadinessSource, ReadyEvent};
pub use ipc::{
    count, notify, pending, recv, recv_match, reply, request, Header, MatchFilter, Message,
    MessageClass,
};
pub use runtime::{cleanup, init, pool_snapshot, run, shutdown, PoolSnapshot, RuntimeConfig};
pub use stack::StackInfo;
pub use supervision::{decode_exit, demonitor, is_exit, link, monitor, unlink};
pub use timer::{after, cancel, every, is_timer, sleep, tick_timer};
pub use util::{ActorId, MonitorRef, TimerId};
pub use wait::Timeout;

/// Convenience re-exports for glob import.
pub mod prelude {
    pub use crate::actor::{
        alive, current, exit, spawn, spawn_ex, yield_now, ExitReason, Priority, SpawnConfig,
    };
    pub use crate::error::{RtError, RtResult};
    pub use crate::ipc::{
        count, notify, pending, recv, recv_match, reply, request, MatchFilter, Message,
        MessageClass,
    };
    pub use crate::runtime::{cleanup, init, run, shutdown, RuntimeConfig};
    pub use crate::supervision::{decode_exit, demonitor, is_exit, link, monitor, unlink};
    pub use crate::timer::{after, cancel, every, is_timer, sleep};
    pub use crate::util::{ActorId, MonitorRef, TimerId};
    pub use crate::wait::Timeout;
}

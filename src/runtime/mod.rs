//! Runtime lifecycle: configuration, the singleton context, and the event
//! loop driving dispatch, timers, and readiness draining.

pub mod config;
pub(crate) mod context;
pub mod event_loop;

pub use config::{RuntimeConfig, RuntimeConfigBuilder};
pub use context::{pool_snapshot, PoolSnapshot};
pub use event_loop::{cleanup, init, run, shutdown};

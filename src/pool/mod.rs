//! Fixed-capacity slot pools backing every core data structure.
//!
//! All runtime state that scales with load (actors, envelopes, payloads,
//! links, monitors, timers) lives in pools sized once at init. Allocation and
//! release are O(1) over an intrusive free list of slot indices; exhaustion
//! surfaces as `NoMem` to the caller and is never retried internally.

pub mod slot;

pub use slot::{PoolStats, SlotPool};

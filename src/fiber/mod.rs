//! Stack-switched execution contexts.
//!
//! The scheduler must control switch points precisely, so context transfer is
//! a small callee-saved register swap per supported ABI rather than a
//! runtime-provided async scheduler. Supported: x86_64 and aarch64 SysV.

pub mod context;

pub use context::FiberContext;
pub(crate) use context::fiber_switch;

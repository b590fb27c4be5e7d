//! Actor stack management.
//!
//! Stacks are carved from a contiguous arena sized at init, with a heap
//! fallback for requests the arena cannot satisfy (or that explicitly ask for
//! a heap stack). Every stack carries a sentinel word at its low end; the
//! scheduler verifies the sentinel whenever an actor switches out and treats
//! a clobbered sentinel as a stack overflow crash.

pub mod arena;
pub mod segment;

pub use arena::StackArena;
pub use segment::{StackInfo, StackSegment, STACK_SENTINEL};

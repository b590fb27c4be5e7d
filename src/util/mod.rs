//! Shared utilities: generation-tagged handle types.

pub mod ids;

pub use ids::{ActorId, MonitorRef, TimerId};

//! Monitor trait and severity ladder.

// Layer 1: Standard library imports
use std::fmt::Debug;

// Layer 2: Third-party crate imports
use serde::Serialize;

// Layer 3: Internal module imports
use super::events::RuntimeEvent;

/// Event severity, ordered lowest to highest for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum EventSeverity {
    /// Routine per-operation events.
    Debug,
    /// Normal lifecycle milestones.
    Info,
    /// Degraded behavior (dropped messages, pool pressure).
    Warning,
    /// Faults (crashes, stack-guard trips, deadlock).
    Error,
}

/// Sink for runtime events.
///
/// Implementations must be cheap and must not call back into runtime
/// operations; `record` runs inside the runtime's critical section.
pub trait RuntimeMonitor: Debug {
    /// Observe one event.
    fn record(&mut self, event: &RuntimeEvent);
}

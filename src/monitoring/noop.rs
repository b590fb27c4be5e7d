//! Default do-nothing monitor sink.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use super::events::RuntimeEvent;
use super::traits::RuntimeMonitor;

/// Discards every event. Installed by default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMonitor;

impl RuntimeMonitor for NoopMonitor {
    fn record(&mut self, _event: &RuntimeEvent) {}
}

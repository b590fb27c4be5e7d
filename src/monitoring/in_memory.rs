//! In-memory monitor sink for tests and diagnostics.

// Layer 1: Standard library imports
use std::cell::RefCell;
use std::rc::Rc;

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use super::events::{RuntimeEvent, RuntimeEventKind};
use super::traits::RuntimeMonitor;

/// Collects events into a shared buffer.
///
/// Clones share the same buffer, so a test can keep one handle, install the
/// other, and inspect what the runtime recorded after `run` returns. The
/// runtime is single-threaded, so an `Rc<RefCell<_>>` buffer is all the
/// sharing this needs.
///
/// # Examples
///
/// ```rust
/// use filament_rt::monitoring::{InMemoryMonitor, RuntimeMonitor, RuntimeEvent, RuntimeEventKind};
///
/// let handle = InMemoryMonitor::new();
/// let mut sink = handle.clone();
/// sink.record(&RuntimeEvent::now(RuntimeEventKind::RuntimeStarted));
/// assert_eq!(handle.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryMonitor {
    events: Rc<RefCell<Vec<RuntimeEvent>>>,
}

impl InMemoryMonitor {
    /// New empty buffer.
    pub fn new() -> Self {
        InMemoryMonitor::default()
    }

    /// Copy of all recorded events, in order.
    pub fn snapshot(&self) -> Vec<RuntimeEvent> {
        self.events.borrow().clone()
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// Drop all recorded events.
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    /// Count events matching a predicate on the kind.
    pub fn count_matching(&self, pred: impl Fn(&RuntimeEventKind) -> bool) -> usize {
        self.events.borrow().iter().filter(|e| pred(&e.kind)).count()
    }
}

impl RuntimeMonitor for InMemoryMonitor {
    fn record(&mut self, event: &RuntimeEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_buffer() {
        let handle = InMemoryMonitor::new();
        let mut sink = handle.clone();
        sink.record(&RuntimeEvent::now(RuntimeEventKind::RuntimeStarted));
        sink.record(&RuntimeEvent::now(RuntimeEventKind::RuntimeStopped));
        assert_eq!(handle.len(), 2);
        assert!(!handle.is_empty());
    }

    #[test]
    fn test_count_matching() {
        let handle = InMemoryMonitor::new();
        let mut sink = handle.clone();
        sink.record(&RuntimeEvent::now(RuntimeEventKind::RuntimeStarted));
        sink.record(&RuntimeEvent::now(RuntimeEventKind::RuntimeStopped));
        let starts =
            handle.count_matching(|k| matches!(k, RuntimeEventKind::RuntimeStarted));
        assert_eq!(starts, 1);
    }

    #[test]
    fn test_clear() {
        let handle = InMemoryMonitor::new();
        let mut sink = handle.clone();
        sink.record(&RuntimeEvent::now(RuntimeEventKind::RuntimeStarted));
        handle.clear();
        assert!(handle.is_empty());
    }
}

//! Per-actor spawn configuration.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use super::cell::Priority;

/// Configuration for `spawn_ex`.
///
/// # Examples
///
/// ```rust
/// use filament_rt::{Priority, SpawnConfig};
///
/// let config = SpawnConfig::new()
///     .with_stack_size(32 * 1024)
///     .with_priority(Priority::High)
///     .with_name("ingest")
///     .with_heap_stack(true);
/// assert_eq!(config.stack_size, 32 * 1024);
/// assert_eq!(config.name.as_deref(), Some("ingest"));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpawnConfig {
    /// Stack size in bytes; 0 selects the runtime's default stack size.
    pub stack_size: usize,

    /// Scheduling priority.
    pub priority: Priority,

    /// Optional human-readable name, carried for diagnostics only.
    pub name: Option<String>,

    /// Allocate the stack from the heap instead of the arena. The heap is
    /// also used automatically when the arena cannot fit the request.
    pub heap_stack: bool,
}

impl SpawnConfig {
    /// Default configuration: default stack, normal priority, unnamed,
    /// arena-backed stack.
    pub fn new() -> Self {
        SpawnConfig::default()
    }

    /// Set the stack size in bytes (0 = runtime default).
    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = bytes;
        self
    }

    /// Set the scheduling priority.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Set a diagnostic name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Force a heap-allocated stack.
    pub fn with_heap_stack(mut self, heap: bool) -> Self {
        self.heap_stack = heap;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SpawnConfig::new();
        assert_eq!(config.stack_size, 0);
        assert_eq!(config.priority, Priority::Normal);
        assert_eq!(config.name, None);
        assert!(!config.heap_stack);
    }

    #[test]
    fn test_builder_chaining() {
        let config = SpawnConfig::new()
            .with_stack_size(8192)
            .with_priority(Priority::Critical)
            .with_name("worker")
            .with_heap_stack(true);
        assert_eq!(config.stack_size, 8192);
        assert_eq!(config.priority, Priority::Critical);
        assert_eq!(config.name.as_deref(), Some("worker"));
        assert!(config.heap_stack);
    }

    #[test]
    fn test_serde_round_trip() {
        let config = SpawnConfig::new().with_name("n").with_stack_size(4096);
        let json = serde_json::to_string(&config).unwrap();
        let back: SpawnConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.stack_size, 4096);
        assert_eq!(back.name.as_deref(), Some("n"));
    }
}

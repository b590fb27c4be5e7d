//! Runtime configuration with sensible defaults.

// Layer 1: Standard library imports
use std::time::Duration;

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use crate::error::{RtError, RtResult};

/// Default actor table capacity.
pub const DEFAULT_MAX_ACTORS: usize = 64;

/// Default per-actor stack size in bytes.
pub const DEFAULT_STACK_SIZE: usize = 64 * 1024;

/// Default stack arena size in bytes.
pub const DEFAULT_STACK_ARENA_SIZE: usize = 1024 * 1024;

/// Default mailbox envelope pool capacity.
pub const DEFAULT_ENVELOPE_POOL_SIZE: usize = 256;

/// Default message payload pool capacity.
pub const DEFAULT_PAYLOAD_POOL_SIZE: usize = 256;

/// Default link entry pool capacity.
pub const DEFAULT_LINK_POOL_SIZE: usize = 128;

/// Default monitor entry pool capacity.
pub const DEFAULT_MONITOR_POOL_SIZE: usize = 128;

/// Default timer pool capacity.
pub const DEFAULT_TIMER_POOL_SIZE: usize = 64;

/// Default readiness poll timeout.
pub const DEFAULT_IO_POLL_TIMEOUT: Duration = Duration::from_millis(10);

/// Default cap on readiness events handled per loop iteration.
pub const DEFAULT_MAX_READY_EVENTS_PER_TICK: usize = 64;

/// Smallest accepted stack size. Below this even the bootstrap frame and a
/// trivial entry cannot fit.
pub const MIN_STACK_SIZE: usize = 4096;

/// Capacities and tuning knobs, fixed at [`crate::runtime::init`].
///
/// No pool grows after init; every capacity failure surfaces as `NoMem` to
/// the operation that hit it.
///
/// # Examples
///
/// ```rust
/// use filament_rt::RuntimeConfig;
///
/// let config = RuntimeConfig::builder()
///     .with_max_actors(8)
///     .with_timer_pool_size(16)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_actors, 8);
///
/// let invalid = RuntimeConfig::builder().with_max_actors(0).build();
/// assert!(invalid.is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Maximum concurrent actors (1..=65535).
    pub max_actors: usize,

    /// Stack size used when a spawn config asks for 0.
    pub default_stack_size: usize,

    /// Stack arena size; 0 sends every stack to the heap fallback.
    pub stack_arena_size: usize,

    /// Mailbox envelope pool capacity.
    pub envelope_pool_size: usize,

    /// Message payload pool capacity.
    pub payload_pool_size: usize,

    /// Link entry pool capacity (one link consumes two entries).
    pub link_pool_size: usize,

    /// Monitor entry pool capacity.
    pub monitor_pool_size: usize,

    /// Timer pool capacity.
    pub timer_pool_size: usize,

    /// How long one readiness poll may block when the run queues are empty.
    pub io_poll_timeout: Duration,

    /// Cap on readiness events handled per loop iteration.
    pub max_ready_events_per_tick: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            max_actors: DEFAULT_MAX_ACTORS,
            default_stack_size: DEFAULT_STACK_SIZE,
            stack_arena_size: DEFAULT_STACK_ARENA_SIZE,
            envelope_pool_size: DEFAULT_ENVELOPE_POOL_SIZE,
            payload_pool_size: DEFAULT_PAYLOAD_POOL_SIZE,
            link_pool_size: DEFAULT_LINK_POOL_SIZE,
            monitor_pool_size: DEFAULT_MONITOR_POOL_SIZE,
            timer_pool_size: DEFAULT_TIMER_POOL_SIZE,
            io_poll_timeout: DEFAULT_IO_POLL_TIMEOUT,
            max_ready_events_per_tick: DEFAULT_MAX_READY_EVENTS_PER_TICK,
        }
    }
}

impl RuntimeConfig {
    /// Create a configuration builder.
    pub fn builder() -> RuntimeConfigBuilder {
        RuntimeConfigBuilder::default()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> RtResult<()> {
        if self.max_actors == 0 || self.max_actors > usize::from(u16::MAX) {
            return Err(RtError::Invalid("max_actors must be in 1..=65535"));
        }
        if self.default_stack_size < MIN_STACK_SIZE {
            return Err(RtError::Invalid("default_stack_size below minimum"));
        }
        for (size, what) in [
            (self.envelope_pool_size, "envelope_pool_size must be in 1..=65535"),
            (self.payload_pool_size, "payload_pool_size must be in 1..=65535"),
            (self.link_pool_size, "link_pool_size must be in 1..=65535"),
            (self.monitor_pool_size, "monitor_pool_size must be in 1..=65535"),
            (self.timer_pool_size, "timer_pool_size must be in 1..=65535"),
        ] {
            if size == 0 || size > usize::from(u16::MAX) {
                return Err(RtError::Invalid(what));
            }
        }
        if self.max_ready_events_per_tick == 0 {
            return Err(RtError::Invalid("max_ready_events_per_tick must be > 0"));
        }
        Ok(())
    }
}

/// Builder for [`RuntimeConfig`] with a fluent API.
#[derive(Debug, Default)]
pub struct RuntimeConfigBuilder {
    config: RuntimeConfig,
}

impl RuntimeConfigBuilder {
    /// Set the maximum number of concurrent actors.
    pub fn with_max_actors(mut self, max: usize) -> Self {
        self.config.max_actors = max;
        self
    }

    /// Set the default per-actor stack size in bytes.
    pub fn with_default_stack_size(mut self, bytes: usize) -> Self {
        self.config.default_stack_size = bytes;
        self
    }

    /// Set the stack arena size in bytes (0 disables the arena).
    pub fn with_stack_arena_size(mut self, bytes: usize) -> Self {
        self.config.stack_arena_size = bytes;
        self
    }

    /// Set the envelope pool capacity.
    pub fn with_envelope_pool_size(mut self, size: usize) -> Self {
        self.config.envelope_pool_size = size;
        self
    }

    /// Set the payload pool capacity.
    pub fn with_payload_pool_size(mut self, size: usize) -> Self {
        self.config.payload_pool_size = size;
        self
    }

    /// Set the link pool capacity.
    pub fn with_link_pool_size(mut self, size: usize) -> Self {
        self.config.link_pool_size = size;
        self
    }

    /// Set the monitor pool capacity.
    pub fn with_monitor_pool_size(mut self, size: usize) -> Self {
        self.config.monitor_pool_size = size;
        self
    }

    /// Set the timer pool capacity.
    pub fn with_timer_pool_size(mut self, size: usize) -> Self {
        self.config.timer_pool_size = size;
        self
    }

    /// Set the readiness poll timeout.
    pub fn with_io_poll_timeout(mut self, timeout: Duration) -> Self {
        self.config.io_poll_timeout = timeout;
        self
    }

    /// Set the per-iteration readiness event cap.
    pub fn with_max_ready_events_per_tick(mut self, max: usize) -> Self {
        self.config.max_ready_events_per_tick = max;
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> RtResult<RuntimeConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = RuntimeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_actors, DEFAULT_MAX_ACTORS);
        assert_eq!(config.default_stack_size, DEFAULT_STACK_SIZE);
        assert_eq!(config.timer_pool_size, DEFAULT_TIMER_POOL_SIZE);
        assert_eq!(config.io_poll_timeout, DEFAULT_IO_POLL_TIMEOUT);
    }

    #[test]
    fn test_zero_max_actors_rejected() {
        let result = RuntimeConfig::builder().with_max_actors(0).build();
        assert!(matches!(result, Err(RtError::Invalid(_))));
    }

    #[test]
    fn test_oversized_pool_rejected() {
        let result = RuntimeConfig::builder()
            .with_envelope_pool_size(usize::from(u16::MAX) + 1)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_tiny_stack_rejected() {
        let result = RuntimeConfig::builder().with_default_stack_size(1024).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_arena_allowed() {
        let config = RuntimeConfig::builder().with_stack_arena_size(0).build().unwrap();
        assert_eq!(config.stack_arena_size, 0);
    }

    #[test]
    fn test_builder_multiple_options() {
        let config = RuntimeConfig::builder()
            .with_max_actors(10)
            .with_default_stack_size(32 * 1024)
            .with_envelope_pool_size(32)
            .with_payload_pool_size(32)
            .with_link_pool_size(8)
            .with_monitor_pool_size(8)
            .with_timer_pool_size(8)
            .with_io_poll_timeout(Duration::from_millis(1))
            .with_max_ready_events_per_tick(16)
            .build()
            .unwrap();
        assert_eq!(config.max_actors, 10);
        assert_eq!(config.envelope_pool_size, 32);
        assert_eq!(config.max_ready_events_per_tick, 16);
    }

    #[test]
    fn test_serde_round_trip() {
        let config = RuntimeConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: RuntimeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.max_actors, config.max_actors);
        assert_eq!(back.io_poll_timeout, config.io_poll_timeout);
    }
}

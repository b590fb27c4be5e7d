//! Runtime status taxonomy.
//!
//! Every fallible operation in the crate returns [`RtResult`]. The variants
//! cover the complete failure surface of the runtime: pool exhaustion,
//! argument errors, blocking timeouts, non-blocking probes, peer death, and
//! I/O collaborator failures. Success carries no message; failures carry a
//! short static description suitable for logging.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use thiserror::Error;

// Layer 3: Internal module imports
// (none)

/// Result alias used throughout the runtime.
pub type RtResult<T> = Result<T, RtError>;

/// Errors produced by runtime operations.
///
/// # Examples
///
/// ```rust
/// use filament_rt::RtError;
///
/// let err = RtError::NoMem("envelope pool");
/// assert!(err.is_capacity());
/// assert!(err.to_string().contains("envelope pool"));
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RtError {
    /// A fixed-capacity pool has no free slot. Never retried internally;
    /// the caller decides whether to back off or shed load.
    #[error("out of capacity: {0}")]
    NoMem(&'static str),

    /// Argument error. Surfaced immediately, no side effects.
    #[error("invalid argument: {0}")]
    Invalid(&'static str),

    /// A blocking operation reached its deadline.
    #[error("operation timed out")]
    Timeout,

    /// The peer actor is dead, or died while the caller was waiting on it.
    #[error("peer is closed")]
    Closed,

    /// A non-blocking probe found nothing to do. Distinct from [`RtError::Timeout`]
    /// so callers can implement backoff without ambiguity.
    #[error("operation would block")]
    WouldBlock,

    /// An I/O collaborator reported a failure while polling readiness.
    #[error("i/o error: {0}")]
    Io(&'static str),
}

impl RtError {
    /// Check whether the error is a capacity failure.
    ///
    /// Capacity failures are transient: freeing a slot (for example by
    /// receiving a message) makes the next attempt succeed.
    pub fn is_capacity(&self) -> bool {
        matches!(self, RtError::NoMem(_))
    }

    /// Check whether the error reports a non-blocking probe.
    pub fn is_would_block(&self) -> bool {
        matches!(self, RtError::WouldBlock)
    }

    /// Check whether the error indicates the peer is gone.
    ///
    /// A `Closed` waiter cannot succeed by retrying against the same peer.
    pub fn is_closed(&self) -> bool {
        matches!(self, RtError::Closed)
    }
}

//! Typed runtime events.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};
use serde::Serialize;

// Layer 3: Internal module imports
use super::traits::EventSeverity;
use crate::actor::cell::{ExitReason, Priority};
use crate::util::{ActorId, TimerId};

/// One observed runtime event, stamped at creation.
#[derive(Debug, Clone, Serialize)]
pub struct RuntimeEvent {
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// What happened.
    pub kind: RuntimeEventKind,
}

impl RuntimeEvent {
    /// Wrap a kind with the current wall-clock timestamp.
    pub fn now(kind: RuntimeEventKind) -> Self {
        RuntimeEvent {
            timestamp: Utc::now(),
            kind,
        }
    }

    /// Severity derived from the kind.
    pub fn severity(&self) -> EventSeverity {
        match &self.kind {
            RuntimeEventKind::RuntimeStarted | RuntimeEventKind::RuntimeStopped => {
                EventSeverity::Info
            }
            RuntimeEventKind::ActorSpawned { .. } => EventSeverity::Debug,
            RuntimeEventKind::ActorExited { reason, .. } => match reason {
                ExitReason::Normal | ExitReason::Killed => EventSeverity::Info,
                ExitReason::Crash | ExitReason::CrashStack => EventSeverity::Error,
            },
            RuntimeEventKind::StackGuardTripped { .. } => EventSeverity::Error,
            RuntimeEventKind::MessageDropped { .. } => EventSeverity::Warning,
            RuntimeEventKind::TimerFired { .. } => EventSeverity::Debug,
            RuntimeEventKind::DeadlockDetected { .. } => EventSeverity::Error,
        }
    }
}

/// Specific runtime event types.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum RuntimeEventKind {
    /// The run loop started.
    RuntimeStarted,

    /// The run loop returned.
    RuntimeStopped,

    /// An actor was spawned.
    ActorSpawned {
        /// New actor's handle.
        actor: ActorId,
        /// Its scheduling priority.
        priority: Priority,
        /// Its diagnostic name, if any.
        name: Option<String>,
    },

    /// An actor finished its cleanup epilogue.
    ActorExited {
        /// The dead actor's handle.
        actor: ActorId,
        /// Why it terminated.
        reason: ExitReason,
    },

    /// An actor overran its stack into the guard sentinel.
    StackGuardTripped {
        /// The offending actor.
        actor: ActorId,
    },

    /// A message was dropped because a pool was exhausted.
    MessageDropped {
        /// Intended receiver.
        to: ActorId,
        /// Name of the exhausted pool.
        pool: &'static str,
    },

    /// A timer expired and its tick was posted.
    TimerFired {
        /// The timer handle.
        timer: TimerId,
        /// The owning actor.
        owner: ActorId,
    },

    /// Live actors remain but nothing can ever wake them.
    DeadlockDetected {
        /// Number of parked actors.
        suspended: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_mapping() {
        let spawn = RuntimeEvent::now(RuntimeEventKind::ActorSpawned {
            actor: ActorId::from_parts(0, 1),
            priority: Priority::Normal,
            name: None,
        });
        assert_eq!(spawn.severity(), EventSeverity::Debug);

        let crash = RuntimeEvent::now(RuntimeEventKind::ActorExited {
            actor: ActorId::from_parts(0, 1),
            reason: ExitReason::Crash,
        });
        assert_eq!(crash.severity(), EventSeverity::Error);

        let normal = RuntimeEvent::now(RuntimeEventKind::ActorExited {
            actor: ActorId::from_parts(0, 1),
            reason: ExitReason::Normal,
        });
        assert_eq!(normal.severity(), EventSeverity::Info);

        let drop = RuntimeEvent::now(RuntimeEventKind::MessageDropped {
            to: ActorId::from_parts(0, 1),
            pool: "envelope pool",
        });
        assert_eq!(drop.severity(), EventSeverity::Warning);
    }

    #[test]
    fn test_events_serialize() {
        let event = RuntimeEvent::now(RuntimeEventKind::TimerFired {
            timer: TimerId::from_parts(0, 1),
            owner: ActorId::from_parts(1, 1),
        });
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("TimerFired"));
    }

    #[test]
    fn test_severity_ordering() {
        assert!(EventSeverity::Debug < EventSeverity::Info);
        assert!(EventSeverity::Info < EventSeverity::Warning);
        assert!(EventSeverity::Warning < EventSeverity::Error);
    }
}

//! Per-actor control block and the scheduling value types.

// Layer 1: Standard library imports
use std::fmt;

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use crate::fiber::FiberContext;
use crate::stack::StackSegment;
use crate::util::{ActorId, MonitorRef};
use crate::wait::{WaitReason, WakeStatus, INFINITE_DEADLINE};

/// Scheduling priority. Strictly ordered: the scheduler always runs the
/// highest non-empty level and applies no aging, so lower levels can starve
/// under a busy higher level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    /// Dispatched before everything else.
    Critical,
    /// Above normal work.
    High,
    /// Default level.
    Normal,
    /// Background work; runs only when all other levels are idle.
    Low,
}

/// Number of priority levels.
pub const PRIORITY_LEVELS: usize = 4;

impl Priority {
    /// Run-queue index; 0 is Critical.
    pub fn index(self) -> usize {
        match self {
            Priority::Critical => 0,
            Priority::High => 1,
            Priority::Normal => 2,
            Priority::Low => 3,
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

/// Why an actor terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExitReason {
    /// The actor called `exit`.
    Normal,
    /// The actor's entry returned without `exit`, or panicked.
    Crash,
    /// The stack-guard sentinel was clobbered.
    CrashStack,
    /// Terminated by runtime shutdown or cleanup.
    Killed,
}

impl ExitReason {
    /// Wire byte used inside exit-notification payloads.
    pub(crate) fn to_byte(self) -> u8 {
        match self {
            ExitReason::Normal => 0,
            ExitReason::Crash => 1,
            ExitReason::CrashStack => 2,
            ExitReason::Killed => 3,
        }
    }

    pub(crate) fn from_byte(b: u8) -> Option<ExitReason> {
        match b {
            0 => Some(ExitReason::Normal),
            1 => Some(ExitReason::Crash),
            2 => Some(ExitReason::CrashStack),
            3 => Some(ExitReason::Killed),
            _ => None,
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExitReason::Normal => "normal",
            ExitReason::Crash => "crash",
            ExitReason::CrashStack => "crash-stack",
            ExitReason::Killed => "killed",
        };
        f.write_str(name)
    }
}

/// Lifecycle state. An actor is in the run queue of its priority iff
/// Runnable (and not currently executing), parked iff Suspended, and gone
/// from the table once the cleanup epilogue finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ActorState {
    Runnable,
    Suspended,
    Dead,
}

/// Unwind payload used by `exit` and by kill-on-resume; the trampoline maps
/// it to the carried reason. Any other unwind payload is a crash.
pub(crate) struct ExitSignal(pub ExitReason);

/// Per-actor control block.
///
/// Owned by the actor table; all cross-references (mailbox entries, links,
/// watchers) are pool slot indices so ownership stays flat.
pub(crate) struct ActorCell {
    pub id: ActorId,
    pub name: Option<String>,
    pub priority: Priority,
    pub state: ActorState,

    // Execution context.
    pub stack: Option<StackSegment>,
    pub ctx: FiberContext,
    pub entry: Option<Box<dyn FnOnce()>>,

    // Mailbox: FIFO chain of envelope-pool indices.
    pub mbox_head: Option<u16>,
    pub mbox_tail: Option<u16>,
    pub mbox_len: usize,

    // Blocking state.
    pub wait: Option<WaitReason>,
    pub deadline: u64,
    pub wake: Option<WakeStatus>,

    // Supervision: link-pool chain, watcher (monitor-pool) chain, and the
    // monitor references this actor holds on others.
    pub links: Option<u16>,
    pub watchers: Option<u16>,
    pub held_monitors: Vec<MonitorRef>,

    pub kill_pending: bool,
    pub exit_reason: Option<ExitReason>,
}

impl ActorCell {
    pub fn new(
        name: Option<String>,
        priority: Priority,
        stack: StackSegment,
        ctx: FiberContext,
        entry: Box<dyn FnOnce()>,
    ) -> Self {
        ActorCell {
            id: ActorId::INVALID,
            name,
            priority,
            state: ActorState::Runnable,
            stack: Some(stack),
            ctx,
            entry: Some(entry),
            mbox_head: None,
            mbox_tail: None,
            mbox_len: 0,
            wait: None,
            deadline: INFINITE_DEADLINE,
            wake: None,
            links: None,
            watchers: None,
            held_monitors: Vec::new(),
            kill_pending: false,
            exit_reason: None,
        }
    }

    pub fn is_suspended(&self) -> bool {
        self.state == ActorState::Suspended
    }
}

impl fmt::Debug for ActorCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorCell")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("state", &self.state)
            .field("mbox_len", &self.mbox_len)
            .field("wait", &self.wait)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_indices_are_strictly_ordered() {
        assert_eq!(Priority::Critical.index(), 0);
        assert_eq!(Priority::High.index(), 1);
        assert_eq!(Priority::Normal.index(), 2);
        assert_eq!(Priority::Low.index(), 3);
        assert!(Priority::Critical < Priority::Low);
    }

    #[test]
    fn test_default_priority_is_normal() {
        assert_eq!(Priority::default(), Priority::Normal);
    }

    #[test]
    fn test_exit_reason_byte_round_trip() {
        for reason in [
            ExitReason::Normal,
            ExitReason::Crash,
            ExitReason::CrashStack,
            ExitReason::Killed,
        ] {
            assert_eq!(ExitReason::from_byte(reason.to_byte()), Some(reason));
        }
        assert_eq!(ExitReason::from_byte(9), None);
    }

    #[test]
    fn test_exit_reason_display() {
        assert_eq!(ExitReason::CrashStack.to_string(), "crash-stack");
        assert_eq!(ExitReason::Normal.to_string(), "normal");
    }

    #[test]
    fn test_priority_serde_round_trip() {
        let json = serde_json::to_string(&Priority::High).unwrap();
        let back: Priority = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Priority::High);
    }
}

//! Generation-tagged handle types.
//!
//! Every handle is a 32-bit value combining a pool slot index with the slot's
//! generation counter. The runtime bumps a slot's generation when the slot is
//! recycled, so a stale handle never aliases the slot's next occupant: the
//! full 32 bits must match for a lookup to succeed. The all-zero value is the
//! reserved "invalid" sentinel for every handle type.

// Layer 1: Standard library imports
use std::fmt::{self, Display};

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
// (none)

/// Handle identifying an actor.
///
/// Layout: bits 31..16 hold the slot generation, bits 15..0 hold
/// `slot + 1` so that the zero value stays reserved as [`ActorId::INVALID`].
///
/// # Examples
///
/// ```rust
/// use filament_rt::ActorId;
///
/// let id = ActorId::from_parts(3, 7);
/// assert_eq!(id.slot(), Some(3));
/// assert_eq!(id.generation(), 7);
/// assert!(id.is_valid());
/// assert!(!ActorId::INVALID.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(u32);

impl ActorId {
    /// The reserved invalid handle.
    pub const INVALID: ActorId = ActorId(0);

    /// Build a handle from a pool slot index and its generation.
    pub fn from_parts(slot: u16, generation: u16) -> Self {
        ActorId((u32::from(generation) << 16) | (u32::from(slot) + 1))
    }

    /// Reconstruct a handle from its raw 32-bit value.
    pub fn from_raw(raw: u32) -> Self {
        ActorId(raw)
    }

    /// The raw 32-bit value.
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// The pool slot index, or `None` for the invalid handle.
    pub fn slot(self) -> Option<u16> {
        let low = (self.0 & 0xFFFF) as u16;
        low.checked_sub(1)
    }

    /// The generation the handle was minted with.
    pub fn generation(self) -> u16 {
        (self.0 >> 16) as u16
    }

    /// Whether this is a structurally valid (non-sentinel) handle.
    pub fn is_valid(self) -> bool {
        self.0 & 0xFFFF != 0
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::INVALID
    }
}

impl Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.slot() {
            Some(slot) => write!(f, "<{}.{}>", slot, self.generation()),
            None => write!(f, "<invalid>"),
        }
    }
}

/// Handle identifying a timer registration.
///
/// Timer handles travel inside the 27-bit tag field of timer-tick messages,
/// so the generation is truncated to 11 bits: bits 26..16 hold the
/// generation, bits 15..0 hold `slot + 1`.
///
/// # Examples
///
/// ```rust
/// use filament_rt::TimerId;
///
/// let id = TimerId::from_parts(0, 5);
/// assert_eq!(id.slot(), Some(0));
/// assert_eq!(id.generation(), 5);
/// assert!(id.as_u32() <= 0x07FF_FFFF); // fits the tag field
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerId(u32);

impl TimerId {
    /// The reserved invalid handle.
    pub const INVALID: TimerId = TimerId(0);

    /// Generation bits carried by a timer handle.
    pub const GENERATION_BITS: u32 = 11;

    /// Build a handle from a pool slot index and its generation.
    ///
    /// The generation wraps at 2^11; the slot index disambiguates within a
    /// wrap window, and the timer pool is small enough that a full wrap with
    /// the same slot outstanding does not occur in practice.
    pub fn from_parts(slot: u16, generation: u16) -> Self {
        let generation = u32::from(generation) & ((1 << Self::GENERATION_BITS) - 1);
        TimerId((generation << 16) | (u32::from(slot) + 1))
    }

    /// Reconstruct a handle from its raw value (for example a message tag).
    pub fn from_raw(raw: u32) -> Self {
        TimerId(raw)
    }

    /// The raw value; always fits in 27 bits.
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// The pool slot index, or `None` for the invalid handle.
    pub fn slot(self) -> Option<u16> {
        let low = (self.0 & 0xFFFF) as u16;
        low.checked_sub(1)
    }

    /// The (truncated) generation the handle was minted with.
    pub fn generation(self) -> u16 {
        ((self.0 >> 16) & ((1 << Self::GENERATION_BITS) - 1)) as u16
    }

    /// Whether this is a structurally valid (non-sentinel) handle.
    pub fn is_valid(self) -> bool {
        self.0 & 0xFFFF != 0
    }
}

impl Default for TimerId {
    fn default() -> Self {
        Self::INVALID
    }
}

impl Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.slot() {
            Some(slot) => write!(f, "timer<{}.{}>", slot, self.generation()),
            None => write!(f, "timer<invalid>"),
        }
    }
}

/// Handle identifying one monitor registration, returned by `monitor` and
/// consumed by `demonitor`. Same layout as [`ActorId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MonitorRef(u32);

impl MonitorRef {
    /// The reserved invalid handle.
    pub const INVALID: MonitorRef = MonitorRef(0);

    /// Build a handle from a pool slot index and its generation.
    pub fn from_parts(slot: u16, generation: u16) -> Self {
        MonitorRef((u32::from(generation) << 16) | (u32::from(slot) + 1))
    }

    /// The raw 32-bit value.
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// The pool slot index, or `None` for the invalid handle.
    pub fn slot(self) -> Option<u16> {
        let low = (self.0 & 0xFFFF) as u16;
        low.checked_sub(1)
    }

    /// The generation the handle was minted with.
    pub fn generation(self) -> u16 {
        (self.0 >> 16) as u16
    }

    /// Whether this is a structurally valid (non-sentinel) handle.
    pub fn is_valid(self) -> bool {
        self.0 & 0xFFFF != 0
    }
}

impl Default for MonitorRef {
    fn default() -> Self {
        Self::INVALID
    }
}

impl Display for MonitorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.slot() {
            Some(slot) => write!(f, "monitor<{}.{}>", slot, self.generation()),
            None => write!(f, "monitor<invalid>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_id_round_trip() {
        let id = ActorId::from_parts(41, 1000);
        assert_eq!(id.slot(), Some(41));
        assert_eq!(id.generation(), 1000);
        assert_eq!(ActorId::from_raw(id.as_u32()), id);
    }

    #[test]
    fn test_actor_id_invalid_sentinel() {
        assert_eq!(ActorId::INVALID.as_u32(), 0);
        assert_eq!(ActorId::INVALID.slot(), None);
        assert!(!ActorId::INVALID.is_valid());
        assert_eq!(ActorId::default(), ActorId::INVALID);
    }

    #[test]
    fn test_actor_id_generation_distinguishes_recycled_slot() {
        let first = ActorId::from_parts(3, 1);
        let recycled = ActorId::from_parts(3, 2);
        assert_ne!(first, recycled);
        assert_eq!(first.slot(), recycled.slot());
    }

    #[test]
    fn test_actor_id_display() {
        let id = ActorId::from_parts(5, 2);
        assert_eq!(format!("{id}"), "<5.2>");
        assert_eq!(format!("{}", ActorId::INVALID), "<invalid>");
    }

    #[test]
    fn test_timer_id_fits_tag_field() {
        let id = TimerId::from_parts(u16::MAX - 1, u16::MAX);
        assert!(id.as_u32() <= 0x07FF_FFFF);
    }

    #[test]
    fn test_timer_id_generation_truncation() {
        let id = TimerId::from_parts(0, 2048);
        // 2048 == 2^11 wraps to 0
        assert_eq!(id.generation(), 0);
        let id = TimerId::from_parts(0, 2047);
        assert_eq!(id.generation(), 2047);
    }

    #[test]
    fn test_monitor_ref_round_trip() {
        let r = MonitorRef::from_parts(9, 77);
        assert_eq!(r.slot(), Some(9));
        assert_eq!(r.generation(), 77);
        assert!(r.is_valid());
        assert!(!MonitorRef::INVALID.is_valid());
    }

    #[test]
    fn test_serde_round_trip() {
        let id = ActorId::from_parts(1, 2);
        let json = serde_json::to_string(&id).unwrap();
        let back: ActorId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}

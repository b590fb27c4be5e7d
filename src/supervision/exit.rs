//! Exit-notification encoding.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use crate::actor::cell::ExitReason;
use crate::error::{RtError, RtResult};
use crate::ipc::{Header, Message, MessageClass};
use crate::runtime::context::Runtime;
use crate::util::ActorId;

/// Reserved tag marking System-class exit notifications.
pub(crate) const EXIT_TAG: u32 = 0x07FF_FFFF;

/// Payload layout: 4-byte big-endian actor handle + 1 reason byte.
pub(crate) const EXIT_PAYLOAD_LEN: usize = 5;

pub(crate) fn encode_exit_payload(actor: ActorId, reason: ExitReason) -> [u8; EXIT_PAYLOAD_LEN] {
    let mut payload = [0u8; EXIT_PAYLOAD_LEN];
    payload[..4].copy_from_slice(&actor.as_u32().to_be_bytes());
    payload[4] = reason.to_byte();
    payload
}

/// Whether a received message is an exit notification from a link or
/// monitor.
pub fn is_exit(message: &Message) -> bool {
    message.class() == MessageClass::System && message.tag() == EXIT_TAG
}

/// Decode an exit notification into the dead actor's handle and its exit
/// reason. Fails with `Invalid` for non-exit messages.
///
/// # Examples
///
/// ```rust,ignore
/// let msg = filament_rt::recv(Timeout::Infinite)?;
/// if filament_rt::is_exit(&msg) {
///     let (who, reason) = filament_rt::decode_exit(&msg)?;
///     eprintln!("peer {who} exited: {reason}");
/// }
/// ```
pub fn decode_exit(message: &Message) -> RtResult<(ActorId, ExitReason)> {
    if !is_exit(message) {
        return Err(RtError::Invalid("not an exit message"));
    }
    let data = message.data();
    if data.len() != EXIT_PAYLOAD_LEN {
        return Err(RtError::Invalid("malformed exit payload"));
    }
    let raw = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
    let reason =
        ExitReason::from_byte(data[4]).ok_or(RtError::Invalid("malformed exit payload"))?;
    Ok((ActorId::from_raw(raw), reason))
}

impl Runtime {
    /// Post an exit notification, addressed from the dying actor. Delivery
    /// failures (dead observer, exhausted pools) are dropped; `deliver`
    /// already records the drop.
    pub(crate) fn deliver_exit(&mut self, to: ActorId, dying: ActorId, reason: ExitReason) {
        let header = Header::new(MessageClass::System, EXIT_TAG);
        let payload = encode_exit_payload(dying, reason);
        let _ = self.deliver(to, dying, header, &payload);
    }
}

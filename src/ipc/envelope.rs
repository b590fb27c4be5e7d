//! Pool-backed message envelopes and payload slots.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use super::header::Header;
use super::message::{HEADER_SIZE, MAX_MESSAGE_SIZE};
use crate::util::ActorId;

/// Fixed-size buffer from the payload pool. The encoded header occupies the
/// first four bytes; payload data follows.
pub(crate) type PayloadSlot = [u8; MAX_MESSAGE_SIZE];

/// One mailbox entry. Envelope and payload come from separate pools, so a
/// zero-length message consumes an envelope slot but no payload slot.
#[derive(Debug)]
pub(crate) struct Envelope {
    pub sender: ActorId,
    /// Encoded header; also duplicated at the front of the payload slot
    /// when one exists.
    pub header: u32,
    /// Payload pool slot index, `None` for zero-length messages.
    pub payload: Option<u16>,
    /// Payload length in bytes (excluding the header).
    pub len: usize,
    /// Next envelope in the receiving actor's mailbox.
    pub next: Option<u16>,
}

impl Envelope {
    pub fn decoded_header(&self) -> Header {
        // The runtime only stores headers it encoded itself.
        Header::decode(self.header).expect("stored header is well-formed")
    }
}

/// Write header and data into a payload slot.
pub(crate) fn fill_payload(slot: &mut PayloadSlot, header: Header, data: &[u8]) {
    debug_assert!(HEADER_SIZE + data.len() <= MAX_MESSAGE_SIZE);
    slot[..HEADER_SIZE].copy_from_slice(&header.to_be_bytes());
    slot[HEADER_SIZE..HEADER_SIZE + data.len()].copy_from_slice(data);
}

/// Borrow the data region of a payload slot.
pub(crate) fn payload_data(slot: &PayloadSlot, len: usize) -> &[u8] {
    &slot[HEADER_SIZE..HEADER_SIZE + len]
}

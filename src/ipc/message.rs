//! Owned received-message value and selective-receive filters.

// Layer 1: Standard library imports
use std::fmt;

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use super::header::{Header, MessageClass};
use crate::util::ActorId;

/// Maximum message size including the 4-byte header.
pub const MAX_MESSAGE_SIZE: usize = 256;

/// Size of the encoded header at the front of a payload slot.
pub const HEADER_SIZE: usize = 4;

/// Maximum payload bytes per message.
pub const MAX_PAYLOAD: usize = MAX_MESSAGE_SIZE - HEADER_SIZE;

/// A received message.
///
/// Receiving copies the payload out of the runtime's pools, so the value is
/// fully owned: the bytes stay valid for as long as the receiver keeps it,
/// independent of later receive calls.
#[derive(Clone)]
pub struct Message {
    pub(crate) sender: ActorId,
    pub(crate) header: Header,
    pub(crate) len: usize,
    pub(crate) buf: [u8; MAX_PAYLOAD],
}

impl Message {
    pub(crate) fn from_parts(sender: ActorId, header: Header, payload: &[u8]) -> Self {
        debug_assert!(payload.len() <= MAX_PAYLOAD);
        let mut buf = [0u8; MAX_PAYLOAD];
        buf[..payload.len()].copy_from_slice(payload);
        Message {
            sender,
            header,
            len: payload.len(),
            buf,
        }
    }

    /// Handle of the sending actor. Timer ticks and exit notifications are
    /// sent by the runtime and carry the owner/dying actor respectively.
    pub fn sender(&self) -> ActorId {
        self.sender
    }

    /// The decoded header.
    pub fn header(&self) -> Header {
        self.header
    }

    /// Message class shortcut.
    pub fn class(&self) -> MessageClass {
        self.header.class
    }

    /// Tag value shortcut.
    pub fn tag(&self) -> u32 {
        self.header.tag
    }

    /// Payload bytes.
    pub fn data(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("sender", &self.sender)
            .field("class", &self.header.class)
            .field("tag", &self.header.tag)
            .field("len", &self.len)
            .finish()
    }
}

/// Filter for selective receive.
///
/// Every field is optional; `None` matches anything. The mailbox is scanned
/// front to back and the first envelope matching all set fields is taken,
/// leaving the rest in order.
///
/// # Examples
///
/// ```rust
/// use filament_rt::ipc::{MatchFilter, MessageClass};
///
/// let filter = MatchFilter::any().with_class(MessageClass::Reply).with_tag(7);
/// assert_eq!(filter.class, Some(MessageClass::Reply));
/// assert_eq!(filter.tag, Some(7));
/// assert_eq!(filter.sender, None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchFilter {
    /// Only match messages from this sender.
    pub sender: Option<ActorId>,
    /// Only match messages of this class.
    pub class: Option<MessageClass>,
    /// Only match messages with this tag value.
    pub tag: Option<u32>,
}

impl MatchFilter {
    /// A filter matching every message.
    pub fn any() -> Self {
        MatchFilter::default()
    }

    /// Restrict to one sender.
    pub fn with_sender(mut self, sender: ActorId) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Restrict to one message class.
    pub fn with_class(mut self, class: MessageClass) -> Self {
        self.class = Some(class);
        self
    }

    /// Restrict to one tag value.
    pub fn with_tag(mut self, tag: u32) -> Self {
        self.tag = Some(tag);
        self
    }

    /// Whether an envelope with the given origin and header matches.
    pub(crate) fn matches(&self, sender: ActorId, header: Header) -> bool {
        if let Some(want) = self.sender {
            if want != sender {
                return false;
            }
        }
        if let Some(want) = self.class {
            if want != header.class {
                return false;
            }
        }
        if let Some(want) = self.tag {
            if want != header.tag {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(sender: ActorId, class: MessageClass, tag: u32) -> (ActorId, Header) {
        (sender, Header::new(class, tag))
    }

    #[test]
    fn test_message_owns_payload() {
        let m = Message::from_parts(
            ActorId::from_parts(0, 1),
            Header::new(MessageClass::Notify, 5),
            b"hello",
        );
        assert_eq!(m.data(), b"hello");
        assert_eq!(m.len(), 5);
        assert!(!m.is_empty());
        assert_eq!(m.tag(), 5);
        assert_eq!(m.class(), MessageClass::Notify);
    }

    #[test]
    fn test_empty_message() {
        let m = Message::from_parts(
            ActorId::INVALID,
            Header::new(MessageClass::Timer, 1),
            &[],
        );
        assert!(m.is_empty());
        assert_eq!(m.data(), &[] as &[u8]);
    }

    #[test]
    fn test_filter_any_matches_everything() {
        let (s, h) = msg(ActorId::from_parts(1, 1), MessageClass::Notify, 42);
        assert!(MatchFilter::any().matches(s, h));
    }

    #[test]
    fn test_filter_sender_mismatch() {
        let (s, h) = msg(ActorId::from_parts(1, 1), MessageClass::Notify, 42);
        let filter = MatchFilter::any().with_sender(ActorId::from_parts(2, 1));
        assert!(!filter.matches(s, h));
    }

    #[test]
    fn test_filter_all_fields() {
        let sender = ActorId::from_parts(3, 2);
        let (s, h) = msg(sender, MessageClass::Reply, 9);
        let hit = MatchFilter::any()
            .with_sender(sender)
            .with_class(MessageClass::Reply)
            .with_tag(9);
        let miss = hit.with_tag(10);
        assert!(hit.matches(s, h));
        assert!(!miss.matches(s, h));
    }

    #[test]
    fn test_payload_bounds() {
        assert_eq!(MAX_PAYLOAD, MAX_MESSAGE_SIZE - HEADER_SIZE);
        let data = [7u8; MAX_PAYLOAD];
        let m = Message::from_parts(
            ActorId::from_parts(0, 0),
            Header::new(MessageClass::Notify, 0),
            &data,
        );
        assert_eq!(m.len(), MAX_PAYLOAD);
        assert!(m.data().iter().all(|&b| b == 7));
    }
}

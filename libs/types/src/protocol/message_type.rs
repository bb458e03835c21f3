//! GIOP message types (header byte 7)

use num_enum::TryFromPrimitive;
use std::fmt;

/// The eight GIOP message kinds
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MessageType {
    Request = 0,
    Reply = 1,
    CancelRequest = 2,
    LocateRequest = 3,
    LocateReply = 4,
    CloseConnection = 5,
    MessageError = 6,
    Fragment = 7,
}

impl MessageType {
    pub const ALL: [MessageType; 8] = [
        MessageType::Request,
        MessageType::Reply,
        MessageType::CancelRequest,
        MessageType::LocateRequest,
        MessageType::LocateReply,
        MessageType::CloseConnection,
        MessageType::MessageError,
        MessageType::Fragment,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MessageType::Request => "Request",
            MessageType::Reply => "Reply",
            MessageType::CancelRequest => "CancelRequest",
            MessageType::LocateRequest => "LocateRequest",
            MessageType::LocateReply => "LocateReply",
            MessageType::CloseConnection => "CloseConnection",
            MessageType::MessageError => "MessageError",
            MessageType::Fragment => "Fragment",
        }
    }

    /// Header-only messages never carry body bytes
    pub fn is_header_only(self) -> bool {
        matches!(
            self,
            MessageType::CloseConnection | MessageType::MessageError
        )
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_wire_values() {
        for (i, ty) in MessageType::ALL.iter().enumerate() {
            assert_eq!(*ty as u8, i as u8);
            assert_eq!(MessageType::try_from(i as u8).unwrap(), *ty);
        }
        assert!(MessageType::try_from(8u8).is_err());
        assert!(MessageType::try_from(0xFFu8).is_err());
    }
}

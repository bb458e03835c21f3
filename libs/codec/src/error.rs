//! Protocol-level errors for GIOP message processing
//!
//! Every recognized invariant violation gets its own variant carrying the
//! context needed to diagnose it. Framing errors (anything found while the
//! header is being validated) are connection-fatal; errors found while
//! decoding the fields of an otherwise well-framed body are request-level.

use giop_types::{AddressingDisposition, GiopVersion, MessageType};
use thiserror::Error;

/// GIOP codec errors with diagnostic context
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProtocolError {
    /// Buffer is too small to contain the expected structure
    #[error("Message too small: need {need} bytes, got {got} (context: {context})")]
    MessageTooSmall {
        need: usize,
        got: usize,
        context: String,
    },

    /// Declared size exceeds the configured cap or the 4-byte size field
    #[error("Message too large: {size} bytes exceeds maximum {max}")]
    MessageTooLarge { size: usize, max: usize },

    /// First four bytes are not "GIOP"
    #[error("Magic mismatch: expected {expected:#010x}, got {actual:#010x} (indicates: {diagnosis})")]
    MagicMismatch {
        expected: u32,
        actual: u32,
        diagnosis: String,
    },

    /// Peer speaks a version this side does not accept
    #[error("GIOP version {version} not supported (max supported: {max_supported}, message type: {message_type})")]
    VersionMismatch {
        version: GiopVersion,
        max_supported: GiopVersion,
        message_type: String,
    },

    /// Byte 7 of the header is not a known message type
    #[error("Unknown message type {message_type} in GIOP {version} header")]
    UnknownMessageType {
        message_type: u8,
        version: GiopVersion,
    },

    /// Fragmentation is not allowed for this message type in this version
    #[error("Fragmentation disallowed for {message_type} in GIOP {version} ({context})")]
    FragmentationDisallowed {
        version: GiopVersion,
        message_type: MessageType,
        context: String,
    },

    /// Alternate encoding marker with an unsupported encoding version
    #[error("Unsupported encoding: marker {marker:#04x} version {encoding_version} (supported: 1..={max_supported}, enabled: {enabled})")]
    UnsupportedEncoding {
        marker: u8,
        encoding_version: u8,
        max_supported: u8,
        enabled: bool,
    },

    /// Reply or locate status that does not exist in this version
    #[error("Invalid {kind} status {status} for GIOP {version}")]
    InvalidReplyStatus {
        kind: &'static str,
        status: u32,
        version: GiopVersion,
    },

    /// Enumerated body field carries an out-of-range value
    #[error("Invalid value {value} for {type_name} at body offset {offset}")]
    InvalidEnumValue {
        type_name: &'static str,
        value: i64,
        offset: usize,
    },

    /// Body field could not be marshaled or unmarshaled
    #[error("Marshal error at body offset {offset}: {description}")]
    Marshal { offset: usize, description: String },

    /// Target does not yield a usable object key
    #[error("Invalid object key: {reason}")]
    InvalidObjectKey { reason: String },

    /// Peer addressed the target with a disposition the local policy rejects
    #[error("Addressing disposition {actual} rejected, expected {expected}")]
    AddressingDisposition {
        expected: AddressingDisposition,
        actual: AddressingDisposition,
    },

    /// Request partitioning id outside the configured range
    #[error("Invalid request partitioning id {id}: allowed range is [{min}, {max}]")]
    InvalidRequestPartitioningId { id: i64, min: u8, max: u8 },
}

impl ProtocolError {
    pub fn message_too_small(need: usize, got: usize, context: impl Into<String>) -> Self {
        Self::MessageTooSmall {
            need,
            got,
            context: context.into(),
        }
    }

    /// Create a MagicMismatch error with a guess at what went wrong
    pub fn magic_mismatch(expected: u32, actual: u32) -> Self {
        let diagnosis = match actual {
            0x0000_0000 => "uninitialized buffer",
            0xFFFF_FFFF => "corrupted buffer",
            _ if actual.swap_bytes() == expected => "byte order (endianness) mismatch",
            _ if actual.to_be_bytes().starts_with(b"HTT")
                || actual.to_be_bytes().starts_with(b"GET")
                || actual.to_be_bytes().starts_with(b"POS") =>
            {
                "peer is speaking HTTP"
            }
            _ if (expected ^ actual).count_ones() == 1 => "single bit corruption",
            _ => "data corruption or not a GIOP stream",
        };

        Self::MagicMismatch {
            expected,
            actual,
            diagnosis: diagnosis.to_string(),
        }
    }

    pub fn version_mismatch(
        version: GiopVersion,
        max_supported: GiopVersion,
        message_type: MessageType,
    ) -> Self {
        Self::VersionMismatch {
            version,
            max_supported,
            message_type: message_type.name().to_string(),
        }
    }

    pub fn fragmentation_disallowed(
        version: GiopVersion,
        message_type: MessageType,
        context: impl Into<String>,
    ) -> Self {
        Self::FragmentationDisallowed {
            version,
            message_type,
            context: context.into(),
        }
    }

    pub fn marshal(offset: usize, description: impl Into<String>) -> Self {
        Self::Marshal {
            offset,
            description: description.into(),
        }
    }

    pub fn invalid_object_key(reason: impl Into<String>) -> Self {
        Self::InvalidObjectKey {
            reason: reason.into(),
        }
    }

    /// Whether the connection must be closed after this error
    ///
    /// Framing errors leave the stream position unknown. Body field errors
    /// and construction errors concern a single request.
    pub fn is_connection_fatal(&self) -> bool {
        match self {
            ProtocolError::MessageTooSmall { .. }
            | ProtocolError::MessageTooLarge { .. }
            | ProtocolError::MagicMismatch { .. }
            | ProtocolError::VersionMismatch { .. }
            | ProtocolError::UnknownMessageType { .. }
            | ProtocolError::FragmentationDisallowed { .. }
            | ProtocolError::UnsupportedEncoding { .. } => true,
            ProtocolError::InvalidReplyStatus { .. }
            | ProtocolError::InvalidEnumValue { .. }
            | ProtocolError::Marshal { .. }
            | ProtocolError::InvalidObjectKey { .. }
            | ProtocolError::AddressingDisposition { .. }
            | ProtocolError::InvalidRequestPartitioningId { .. } => false,
        }
    }
}

/// Result type for codec operations
pub type ProtocolResult<T> = std::result::Result<T, ProtocolError>;

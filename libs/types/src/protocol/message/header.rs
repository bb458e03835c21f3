//! GIOP Common Header Implementation
//!
//! The header is identical in layout for all GIOP versions; only the meaning
//! of the flags byte changes between 1.0 and later revisions.

use crate::protocol::constants::{
    FLAG_LITTLE_ENDIAN, FLAG_MORE_FRAGMENTS, GIOP_HEADER_SIZE, GIOP_MAGIC_BYTES,
    THREAD_POOL_MASK, THREAD_POOL_SHIFT,
};
use crate::protocol::message_type::MessageType;
use crate::protocol::version::GiopVersion;

/// Byte order of the size field and the body, selected by flags bit 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum ByteOrder {
    #[default]
    BigEndian,
    LittleEndian,
}

impl ByteOrder {
    pub fn from_flags(flags: u8) -> Self {
        if flags & FLAG_LITTLE_ENDIAN != 0 {
            ByteOrder::LittleEndian
        } else {
            ByteOrder::BigEndian
        }
    }

    pub fn is_little_endian(self) -> bool {
        self == ByteOrder::LittleEndian
    }

    /// The flags bit that encodes this byte order
    pub fn flag_bit(self) -> u8 {
        match self {
            ByteOrder::BigEndian => 0,
            ByteOrder::LittleEndian => FLAG_LITTLE_ENDIAN,
        }
    }
}

/// GIOP common header (12 bytes on the wire)
///
/// ```text
/// ┌──────────┬───────┬───────┬───────┬──────────┬───────────────┐
/// │ "GIOP"   │ major │ minor │ flags │ msg type │ body size (4) │
/// └──────────┴───────┴───────┴───────┴──────────┴───────────────┘
/// ```
///
/// `message_size` is the in-memory size and includes the 12 header bytes.
/// Outbound messages start with `message_size == 0` until the body has been
/// serialized and the size is patched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommonHeader {
    pub version: GiopVersion,
    pub flags: u8,
    pub message_type: MessageType,
    pub message_size: u32,
}

impl CommonHeader {
    /// Header size in bytes
    pub const SIZE: usize = GIOP_HEADER_SIZE;

    /// Magic octets every header starts with
    pub const MAGIC: [u8; 4] = GIOP_MAGIC_BYTES;

    /// Create a header for an outbound message with a placeholder size of 0
    pub fn new(version: GiopVersion, message_type: MessageType, byte_order: ByteOrder) -> Self {
        Self {
            version,
            flags: byte_order.flag_bit(),
            message_type,
            message_size: 0,
        }
    }

    pub fn byte_order(&self) -> ByteOrder {
        ByteOrder::from_flags(self.flags)
    }

    pub fn is_little_endian(&self) -> bool {
        self.byte_order().is_little_endian()
    }

    /// More-fragments-follow bit; always false for GIOP 1.0, where the bit
    /// does not exist
    pub fn more_fragments(&self) -> bool {
        self.version.supports_fragmentation() && self.flags & FLAG_MORE_FRAGMENTS != 0
    }

    pub fn set_more_fragments(&mut self, more: bool) {
        if more {
            self.flags |= FLAG_MORE_FRAGMENTS;
        } else {
            self.flags &= !FLAG_MORE_FRAGMENTS;
        }
    }

    /// Raw request partitioning (thread pool) bits from the flags byte
    ///
    /// GIOP 1.0 has no room for the extension and always reports 0.
    pub fn thread_pool_id(&self) -> u8 {
        if self.version.supports_fragmentation() {
            (self.flags >> THREAD_POOL_SHIFT) & THREAD_POOL_MASK
        } else {
            0
        }
    }

    /// Store a partitioning id in flags bits 2..7; values wider than 6 bits
    /// are masked
    pub fn set_thread_pool_id(&mut self, id: u8) {
        let keep = self.flags & !(THREAD_POOL_MASK << THREAD_POOL_SHIFT);
        self.flags = keep | ((id & THREAD_POOL_MASK) << THREAD_POOL_SHIFT);
    }

    /// Body size implied by `message_size`
    pub fn body_size(&self) -> usize {
        (self.message_size as usize).saturating_sub(Self::SIZE)
    }

    pub fn set_message_size(&mut self, total: u32) {
        self.message_size = total;
    }
}

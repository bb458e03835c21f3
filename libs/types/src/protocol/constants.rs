//! # GIOP Wire Constants
//!
//! ## Purpose
//!
//! Central registry of the fixed values that define the GIOP common header and
//! the proprietary extensions layered on top of it. These values are part of
//! the wire format and must never change.
//!
//! ## Header Layout
//!
//! ```text
//! 0      4     5     6       7        8            12
//! ┌──────┬─────┬─────┬───────┬────────┬────────────┐
//! │ GIOP │ maj │ min │ flags │ msg ty │ body size  │
//! └──────┴─────┴─────┴───────┴────────┴────────────┘
//!  big-endian          │                flags bit0 order
//!                      └─ bit0 byte order, bit1 more fragments,
//!                         bits 2..7 request partitioning id
//! ```

/// "GIOP" in ASCII, always compared big-endian
pub const GIOP_MAGIC: u32 = 0x4749_4F50;

/// Magic as raw bytes, the first four octets of every message
pub const GIOP_MAGIC_BYTES: [u8; 4] = *b"GIOP";

/// Size of the common header for every GIOP version
pub const GIOP_HEADER_SIZE: usize = 12;

pub const MAGIC_OFFSET: usize = 0;
pub const MAJOR_VERSION_OFFSET: usize = 4;
pub const MINOR_VERSION_OFFSET: usize = 5;
pub const FLAGS_OFFSET: usize = 6;
pub const MESSAGE_TYPE_OFFSET: usize = 7;
pub const MESSAGE_SIZE_OFFSET: usize = 8;

/// Flags bit 0: body (and size field) encoded little-endian
pub const FLAG_LITTLE_ENDIAN: u8 = 0x01;

/// Flags bit 1: more fragments follow (GIOP 1.1 and later)
pub const FLAG_MORE_FRAGMENTS: u8 = 0x02;

/// Mask keeping only the byte order and fragment bits
pub const BYTE_ORDER_AND_FRAGMENT_MASK: u8 = 0x03;

/// Request partitioning (thread pool) id lives in flags bits 2..7
pub const THREAD_POOL_SHIFT: u8 = 2;
pub const THREAD_POOL_MASK: u8 = 0x3F;

/// Byte 4 value announcing a Java-serialization encoded body
pub const JAVA_ENC_MARKER: u8 = 0x0D;

/// Highest Java serialization encoding version understood
pub const JAVA_ENC_VERSION: u8 = 1;

/// GIOP 1.2 request and reply bodies start on this boundary
pub const GIOP_1_2_BODY_ALIGNMENT: usize = 8;

/// Size of a request id on the wire
pub const REQUEST_ID_SIZE: usize = 4;

/// GIOP 1.2 fragments carry the request id straight after the common header
pub const FRAGMENT_1_2_HEADER_SIZE: usize = GIOP_HEADER_SIZE + REQUEST_ID_SIZE;

/// GIOP 1.2 response flags, bit 0 set when a reply is expected
pub const RESPONSE_EXPECTED_BIT: u8 = 0x01;

/// Response flags written for a two-way 1.2 request (SYNC_WITH_TARGET)
pub const RESPONSE_FLAGS_SYNC_WITH_TARGET: u8 = 0x03;

/// Standard IIOP profile tag
pub const TAG_INTERNET_IOP: u32 = 0;

/// Vendor minor code set id used for proprietary tags
pub const SUN_VMCID: u32 = 0x5355_0000;

/// Tagged component carrying the request partitioning id
pub const TAG_REQUEST_PARTITIONING_ID: u32 = SUN_VMCID | 0x0001;

pub const DEFAULT_REQUEST_PARTITIONING_ID: u8 = 0;
pub const MIN_REQUEST_PARTITIONING_ID: u8 = 0;
pub const MAX_REQUEST_PARTITIONING_ID: u8 = THREAD_POOL_MASK;

//! Size field patching
//!
//! Outbound messages are serialized with a placeholder size of 0. Once the
//! body length is known the size field (bytes 8..12) is rewritten in the
//! byte order of the flags byte already present in the buffer.

use crate::error::{ProtocolError, ProtocolResult};
use byteorder::{BigEndian, ByteOrder as Endianness, LittleEndian};
use giop_types::{ByteOrder, FLAGS_OFFSET, GIOP_HEADER_SIZE, MESSAGE_SIZE_OFFSET};

/// Write `total_size - 12` into the size field of a serialized message
///
/// Last write wins; patching twice leaves the same bytes as patching once
/// with the second size.
pub fn patch_size(buf: &mut [u8], total_size: usize) -> ProtocolResult<()> {
    if buf.len() < GIOP_HEADER_SIZE {
        return Err(ProtocolError::message_too_small(
            GIOP_HEADER_SIZE,
            buf.len(),
            "size patch target buffer",
        ));
    }
    if total_size < GIOP_HEADER_SIZE {
        return Err(ProtocolError::message_too_small(
            GIOP_HEADER_SIZE,
            total_size,
            "patched message size",
        ));
    }

    let body_size = u32::try_from(total_size - GIOP_HEADER_SIZE).map_err(|_| {
        ProtocolError::MessageTooLarge {
            size: total_size,
            max: u32::MAX as usize,
        }
    })?;

    let byte_order = ByteOrder::from_flags(buf[FLAGS_OFFSET]);
    let size_bytes = &mut buf[MESSAGE_SIZE_OFFSET..GIOP_HEADER_SIZE];
    match byte_order {
        ByteOrder::BigEndian => BigEndian::write_u32(size_bytes, body_size),
        ByteOrder::LittleEndian => LittleEndian::write_u32(size_bytes, body_size),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_patch_respects_flags_byte_order() {
        let mut big = hex!("47494F50 0102 00 00 00000000").to_vec();
        patch_size(&mut big, 12 + 0x0102).unwrap();
        assert_eq!(&big[8..], &[0x00, 0x00, 0x01, 0x02]);

        let mut little = hex!("47494F50 0102 01 00 00000000").to_vec();
        patch_size(&mut little, 12 + 0x0102).unwrap();
        assert_eq!(&little[8..], &[0x02, 0x01, 0x00, 0x00]);
    }

    #[test]
    fn test_patch_rejects_short_inputs() {
        let mut short = [0u8; 8];
        assert!(patch_size(&mut short, 20).is_err());

        let mut header = [0u8; 12];
        assert!(matches!(
            patch_size(&mut header, 11),
            Err(ProtocolError::MessageTooSmall { .. })
        ));
    }
}

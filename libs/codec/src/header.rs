//! # GIOP Header Codec
//!
//! Parses and writes the fixed 12-byte common header.
//!
//! The magic is always compared big-endian. The size field is read in the
//! byte order selected by flags bit 0 and the header length is added, so
//! the returned `message_size` covers the whole message.
//!
//! With the java serialization extension enabled, a `0x0D, n` pair in the
//! version bytes announces an alternate body encoding. The header is then
//! reported as GIOP 1.2 and the encoding is returned next to it; the input
//! buffer is never modified.

use crate::error::{ProtocolError, ProtocolResult};
use byteorder::{BigEndian, ByteOrder as Endianness, LittleEndian};
use giop_config::GiopSettings;
use giop_types::{
    ByteOrder, CommonHeader, EncodingVersion, GiopVersion, MessageType, FLAGS_OFFSET,
    GIOP_HEADER_SIZE, GIOP_MAGIC, GIOP_MAGIC_BYTES, JAVA_ENC_MARKER, JAVA_ENC_VERSION,
    MAJOR_VERSION_OFFSET, MESSAGE_SIZE_OFFSET, MESSAGE_TYPE_OFFSET, MINOR_VERSION_OFFSET,
};

/// Header parser/writer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeaderCodec {
    java_serialization: bool,
}

impl HeaderCodec {
    pub fn new(java_serialization: bool) -> Self {
        Self { java_serialization }
    }

    pub fn from_config(settings: &GiopSettings) -> Self {
        Self::new(settings.java_serialization)
    }

    pub fn java_serialization_enabled(&self) -> bool {
        self.java_serialization
    }

    /// Parse the first 12 bytes of `bytes`
    ///
    /// Only structural checks happen here; version admission and
    /// fragmentation legality belong to [`crate::VersionPolicy`].
    pub fn parse(&self, bytes: &[u8]) -> ProtocolResult<(CommonHeader, EncodingVersion)> {
        if bytes.len() < GIOP_HEADER_SIZE {
            return Err(ProtocolError::message_too_small(
                GIOP_HEADER_SIZE,
                bytes.len(),
                "GIOP common header",
            ));
        }

        let magic = BigEndian::read_u32(&bytes[..4]);
        if magic != GIOP_MAGIC {
            return Err(ProtocolError::magic_mismatch(GIOP_MAGIC, magic));
        }

        let major = bytes[MAJOR_VERSION_OFFSET];
        let minor = bytes[MINOR_VERSION_OFFSET];
        let (version, encoding) = if self.java_serialization && major == JAVA_ENC_MARKER {
            if minor == 0 || minor > JAVA_ENC_VERSION {
                return Err(ProtocolError::UnsupportedEncoding {
                    marker: major,
                    encoding_version: minor,
                    max_supported: JAVA_ENC_VERSION,
                    enabled: true,
                });
            }
            (GiopVersion::V1_2, EncodingVersion::JavaSerialization(minor))
        } else {
            (GiopVersion::new(major, minor), EncodingVersion::Cdr)
        };

        let flags = bytes[FLAGS_OFFSET];
        let raw_type = bytes[MESSAGE_TYPE_OFFSET];
        let message_type =
            MessageType::try_from(raw_type).map_err(|_| ProtocolError::UnknownMessageType {
                message_type: raw_type,
                version,
            })?;

        let size_bytes = &bytes[MESSAGE_SIZE_OFFSET..GIOP_HEADER_SIZE];
        let body_size = match ByteOrder::from_flags(flags) {
            ByteOrder::BigEndian => BigEndian::read_u32(size_bytes),
            ByteOrder::LittleEndian => LittleEndian::read_u32(size_bytes),
        };
        let message_size = body_size
            .checked_add(GIOP_HEADER_SIZE as u32)
            .ok_or(ProtocolError::MessageTooLarge {
                size: body_size as usize + GIOP_HEADER_SIZE,
                max: u32::MAX as usize,
            })?;

        let header = CommonHeader {
            version,
            flags,
            message_type,
            message_size,
        };
        Ok((header, encoding))
    }

    /// Serialize a header
    ///
    /// A `message_size` below 12 (the outbound placeholder) is written as a
    /// zero body size. Non-CDR encodings are written as the java marker for
    /// GIOP 1.2 headers.
    pub fn write(header: &CommonHeader, encoding: EncodingVersion) -> [u8; GIOP_HEADER_SIZE] {
        let mut bytes = [0u8; GIOP_HEADER_SIZE];
        bytes[..4].copy_from_slice(&GIOP_MAGIC_BYTES);

        match encoding {
            EncodingVersion::JavaSerialization(n) if header.version == GiopVersion::V1_2 => {
                bytes[MAJOR_VERSION_OFFSET] = JAVA_ENC_MARKER;
                bytes[MINOR_VERSION_OFFSET] = n;
            }
            _ => {
                bytes[MAJOR_VERSION_OFFSET] = header.version.major;
                bytes[MINOR_VERSION_OFFSET] = header.version.minor;
            }
        }

        bytes[FLAGS_OFFSET] = header.flags;
        bytes[MESSAGE_TYPE_OFFSET] = header.message_type as u8;

        let body_size = header.body_size() as u32;
        let size_bytes = &mut bytes[MESSAGE_SIZE_OFFSET..GIOP_HEADER_SIZE];
        match header.byte_order() {
            ByteOrder::BigEndian => BigEndian::write_u32(size_bytes, body_size),
            ByteOrder::LittleEndian => LittleEndian::write_u32(size_bytes, body_size),
        }
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_parse_big_endian_request() {
        let bytes = hex!("47494F50 0102 00 00 00000010");
        let (header, encoding) = HeaderCodec::default().parse(&bytes).unwrap();

        assert_eq!(header.version, GiopVersion::V1_2);
        assert_eq!(header.message_type, MessageType::Request);
        assert_eq!(header.message_size, 12 + 16);
        assert!(!header.is_little_endian());
        assert_eq!(encoding, EncodingVersion::Cdr);
    }

    #[test]
    fn test_parse_little_endian_size() {
        let bytes = hex!("47494F50 0101 01 01 10000000");
        let (header, _) = HeaderCodec::default().parse(&bytes).unwrap();
        assert_eq!(header.message_type, MessageType::Reply);
        assert_eq!(header.body_size(), 16);
    }

    #[test]
    fn test_parse_too_short() {
        let err = HeaderCodec::default().parse(b"GIOP\x01\x02").unwrap_err();
        assert!(matches!(err, ProtocolError::MessageTooSmall { need: 12, got: 6, .. }));
    }

    #[test]
    fn test_parse_unknown_type() {
        let bytes = hex!("47494F50 0102 00 08 00000000");
        let err = HeaderCodec::default().parse(&bytes).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::UnknownMessageType { message_type: 8, .. }
        ));
    }

    #[test]
    fn test_java_marker_normalized_without_mutation() {
        let bytes = hex!("47494F50 0D01 00 00 00000000");
        let (header, encoding) = HeaderCodec::new(true).parse(&bytes).unwrap();

        assert_eq!(header.version, GiopVersion::V1_2);
        assert_eq!(encoding, EncodingVersion::JavaSerialization(1));
        assert_eq!(bytes[4], 0x0D);

        // Written back as the marker
        let written = HeaderCodec::write(&header, encoding);
        assert_eq!(written, bytes);
    }

    #[test]
    fn test_java_marker_out_of_range() {
        for minor in [0u8, 2] {
            let bytes = [b'G', b'I', b'O', b'P', 0x0D, minor, 0, 0, 0, 0, 0, 0];
            let err = HeaderCodec::new(true).parse(&bytes).unwrap_err();
            assert!(matches!(err, ProtocolError::UnsupportedEncoding { .. }));
        }
    }

    #[test]
    fn test_java_marker_ignored_when_disabled() {
        let bytes = hex!("47494F50 0D01 00 00 00000000");
        let (header, encoding) = HeaderCodec::new(false).parse(&bytes).unwrap();
        assert_eq!(header.version, GiopVersion::new(0x0D, 1));
        assert_eq!(encoding, EncodingVersion::Cdr);
    }

    #[test]
    fn test_write_placeholder_size() {
        let header = CommonHeader::new(
            GiopVersion::V1_0,
            MessageType::CloseConnection,
            ByteOrder::BigEndian,
        );
        assert_eq!(
            HeaderCodec::write(&header, EncodingVersion::Cdr),
            hex!("47494F50 0100 00 05 00000000")
        );
    }
}

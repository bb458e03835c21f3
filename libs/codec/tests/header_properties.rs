//! # Header Codec Properties
//!
//! Property tests over the common header:
//! - write/parse agreement for every legal version, type and flags byte
//! - any single bit flip in the magic is rejected
//! - size patching is idempotent and last-write-wins
//! - the size field follows the byte order flag

use giop_codec::{patch_size, HeaderCodec, ProtocolError};
use giop_types::{CommonHeader, EncodingVersion, MessageType, Revision};
use proptest::prelude::*;

fn any_revision() -> impl Strategy<Value = Revision> {
    prop::sample::select(Revision::ALL.to_vec())
}

fn any_message_type() -> impl Strategy<Value = MessageType> {
    prop::sample::select(MessageType::ALL.to_vec())
}

fn any_header() -> impl Strategy<Value = CommonHeader> {
    (
        any_revision(),
        any::<u8>(),
        any_message_type(),
        12u32..=u32::MAX,
    )
        .prop_map(|(revision, flags, message_type, message_size)| CommonHeader {
            version: revision.version(),
            flags,
            message_type,
            message_size,
        })
}

proptest! {
    #[test]
    fn test_header_write_parse_agree(header in any_header()) {
        let bytes = HeaderCodec::write(&header, EncodingVersion::Cdr);
        let (parsed, encoding) = HeaderCodec::default().parse(&bytes).unwrap();
        prop_assert_eq!(parsed, header);
        prop_assert_eq!(encoding, EncodingVersion::Cdr);
    }

    #[test]
    fn test_magic_bit_flip_rejected(header in any_header(), bit in 0usize..32) {
        let mut bytes = HeaderCodec::write(&header, EncodingVersion::Cdr);
        bytes[bit / 8] ^= 1 << (bit % 8);
        let result = HeaderCodec::default().parse(&bytes);
        prop_assert!(
            matches!(result, Err(ProtocolError::MagicMismatch { .. })),
            "expected magic mismatch, got {:?}",
            result
        );
    }

    #[test]
    fn test_patch_size_last_write_wins(
        header in any_header(),
        first in 12usize..=1 << 20,
        second in 12usize..=1 << 20,
    ) {
        let mut twice = HeaderCodec::write(&header, EncodingVersion::Cdr).to_vec();
        patch_size(&mut twice, first).unwrap();
        patch_size(&mut twice, second).unwrap();

        let mut once = HeaderCodec::write(&header, EncodingVersion::Cdr).to_vec();
        patch_size(&mut once, second).unwrap();
        prop_assert_eq!(&twice, &once);

        let (parsed, _) = HeaderCodec::default().parse(&once).unwrap();
        prop_assert_eq!(parsed.message_size as usize, second);
    }

    #[test]
    fn test_size_field_follows_byte_order(header in any_header()) {
        let little = CommonHeader { flags: header.flags | 0x01, ..header };
        let big = CommonHeader { flags: header.flags & !0x01, ..header };

        let le_bytes = HeaderCodec::write(&little, EncodingVersion::Cdr);
        let be_bytes = HeaderCodec::write(&big, EncodingVersion::Cdr);

        let mut reversed = le_bytes[8..12].to_vec();
        reversed.reverse();
        prop_assert_eq!(&reversed[..], &be_bytes[8..12]);
    }
}

#[test]
fn test_java_marker_parses_as_1_2() {
    let mut bytes = HeaderCodec::write(
        &CommonHeader {
            version: Revision::V1_2.version(),
            flags: 0,
            message_type: MessageType::Request,
            message_size: 20,
        },
        EncodingVersion::JavaSerialization(1),
    );
    assert_eq!(&bytes[4..6], &[0x0D, 0x01]);

    let (header, encoding) = HeaderCodec::new(true).parse(&bytes).unwrap();
    assert_eq!(header.version, Revision::V1_2.version());
    assert_eq!(encoding, EncodingVersion::JavaSerialization(1));

    // unsupported java encoding version
    bytes[5] = 2;
    assert!(matches!(
        HeaderCodec::new(true).parse(&bytes),
        Err(ProtocolError::UnsupportedEncoding { .. })
    ));

    // with the extension disabled the marker is just an odd major version
    bytes[5] = 1;
    let (header, encoding) = HeaderCodec::new(false).parse(&bytes).unwrap();
    assert_eq!(header.version.major, 0x0D);
    assert_eq!(encoding, EncodingVersion::Cdr);
}

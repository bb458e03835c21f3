//! Common header flag handling across GIOP revisions

use giop_types::{
    ByteOrder, CommonHeader, GiopVersion, LocateStatus, MessageType, ReplyStatus, Revision,
    FLAG_MORE_FRAGMENTS,
};

#[test]
fn test_flag_bits_are_independent() {
    for revision in [Revision::V1_1, Revision::V1_2] {
        let mut header =
            CommonHeader::new(revision.version(), MessageType::Request, ByteOrder::LittleEndian);
        header.set_thread_pool_id(0x3F);
        header.set_more_fragments(true);

        assert!(header.is_little_endian());
        assert!(header.more_fragments());
        assert_eq!(header.thread_pool_id(), 0x3F);
        assert_eq!(header.flags, 0xFF);

        header.set_more_fragments(false);
        header.set_thread_pool_id(5);
        assert_eq!(header.flags, (5 << 2) | 0x01);
    }
}

#[test]
fn test_1_0_ignores_fragment_and_pool_bits() {
    let header = CommonHeader {
        version: GiopVersion::V1_0,
        flags: 0xFC | FLAG_MORE_FRAGMENTS,
        message_type: MessageType::Reply,
        message_size: 12,
    };
    assert!(!header.more_fragments());
    assert_eq!(header.thread_pool_id(), 0);
    assert_eq!(header.byte_order(), ByteOrder::BigEndian);
}

#[test]
fn test_body_size_excludes_header() {
    let mut header = CommonHeader::new(GiopVersion::V1_2, MessageType::Reply, ByteOrder::BigEndian);
    assert_eq!(header.body_size(), 0);
    header.set_message_size(40);
    assert_eq!(header.body_size(), 28);
}

#[test]
fn test_status_values_follow_the_wire() {
    assert_eq!(ReplyStatus::try_from(2u32).unwrap(), ReplyStatus::SystemException);
    assert_eq!(LocateStatus::try_from(1u32).unwrap(), LocateStatus::ObjectHere);
    assert!(MessageType::try_from(8u8).is_err());
    assert_eq!(MessageType::try_from(7u8).unwrap(), MessageType::Fragment);
}

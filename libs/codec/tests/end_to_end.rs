//! # Codec End-to-End Tests
//!
//! Whole frames built with [`MessageFactory`], serialized, and parsed back
//! through the same path the frame reader uses:
//! - request, reply and control messages across versions
//! - header-phase rejection before any body is looked at
//! - fragmentation, partitioning bits and handler dispatch

use giop_codec::{
    partitioning_component, unmarshal_request_id, ControlMessage, FragmentMessage, Fragmenter,
    IiopProfile, LocateReplyBody, Message, MessageFactory, MessageHandler, ProtocolError, ReplyBody,
    ReplyMessage, RequestMessage, TargetResolver, VersionPolicy,
};
use giop_codec::{CancelRequestMessage, LocateReplyMessage, LocateRequestMessage};
use giop_config::{AddressingPolicy, OrbConfig};
use giop_types::{
    AddressingDisposition, ByteOrder, CommonHeader, CompletionStatus, EncodingVersion,
    GiopVersion, InvocationTarget, MessageType, ObjectKey, ReplyStatus, ServiceContext,
    SystemExceptionInfo,
};
use hex_literal::hex;

fn key_target() -> InvocationTarget {
    InvocationTarget::from_key(ObjectKey::new(vec![1, 2]))
}

#[test]
fn test_request_1_2_round_trip() {
    let factory = MessageFactory::default();
    let mut request = factory
        .create_request(GiopVersion::V1_2, 42, &key_target(), "foo", true, Vec::new())
        .unwrap();
    let frame = request.to_bytes().unwrap();

    assert_eq!(&frame[..4], b"GIOP");
    assert_eq!(frame[7], MessageType::Request as u8);
    assert_eq!(request.header().message_size as usize, frame.len());

    let decoded = factory.parse_frame(&frame).unwrap();
    let Message::Request(decoded) = decoded else {
        panic!("expected a request");
    };
    assert_eq!(decoded.request_id, 42);
    assert_eq!(decoded.operation, "foo");
    assert!(decoded.is_response_expected());
    assert_eq!(decoded.object_key(), Some(&ObjectKey::new(vec![1, 2])));
    assert!(decoded.body.is_empty());

    // the server can read the id without decoding the body
    let body = &frame[CommonHeader::SIZE..];
    assert_eq!(unmarshal_request_id(body, ByteOrder::BigEndian).unwrap(), 42);
}

#[test]
fn test_request_all_versions_both_byte_orders() {
    for byte_order in [ByteOrder::BigEndian, ByteOrder::LittleEndian] {
        let mut config = OrbConfig::default();
        config.giop.byte_order = byte_order;
        let factory = MessageFactory::from_config(&config);

        for version in [GiopVersion::V1_0, GiopVersion::V1_1, GiopVersion::V1_2] {
            let mut request = factory
                .create_request(version, 7, &key_target(), "ping", false, Vec::new())
                .unwrap()
                .with_body(vec![9, 9, 9])
                .unwrap();
            let frame = request.to_bytes().unwrap();
            let decoded = factory.parse_frame(&frame).unwrap();

            assert_eq!(decoded.version(), version);
            assert_eq!(decoded.header().byte_order(), byte_order);
            assert_eq!(decoded.request_id(), 7);
            let Message::Request(decoded) = decoded else {
                panic!("expected a request");
            };
            assert!(!decoded.is_response_expected());
            assert_eq!(decoded.body, vec![9, 9, 9]);
        }
    }
}

#[test]
fn test_close_connection_1_0_is_header_only() {
    let factory = MessageFactory::default();
    let mut close = factory.create_close_connection(GiopVersion::V1_0).unwrap();
    let frame = close.to_bytes().unwrap();

    assert_eq!(frame, hex!("47494F50 0100 00 05 00000000"));
    let decoded = factory.parse_frame(&frame).unwrap();
    assert_eq!(decoded.message_type(), MessageType::CloseConnection);
    assert_eq!(decoded.request_id(), -1);
}

#[test]
fn test_more_fragments_on_cancel_rejected_at_header() {
    // GIOP 1.2 CancelRequest with the more-fragments bit and no body at all
    let frame = hex!("47494F50 0102 02 02 00000000");
    let factory = MessageFactory::default();

    let (header, _) = factory.header_codec().parse(&frame).unwrap();
    let err = factory.policy().validate_header(&header).unwrap_err();
    assert!(matches!(
        err,
        ProtocolError::FragmentationDisallowed {
            message_type: MessageType::CancelRequest,
            ..
        }
    ));
    assert!(err.is_connection_fatal());
    assert_eq!(factory.parse_frame(&frame).unwrap_err(), err);
}

#[test]
fn test_reply_exception_fields() {
    let factory = MessageFactory::default();
    let info = SystemExceptionInfo::new(
        "IDL:omg.org/CORBA/BAD_OPERATION:1.0",
        0x4F4D_0002,
        CompletionStatus::Maybe,
    );

    let mut failed = factory
        .create_reply(GiopVersion::V1_2, 5, ReplyBody::SystemException(info), Vec::new())
        .unwrap();
    let decoded = factory.parse_frame(&failed.to_bytes().unwrap()).unwrap();
    let Message::Reply(reply) = decoded else {
        panic!("expected a reply");
    };
    assert_eq!(reply.reply_status(), ReplyStatus::SystemException);
    assert_eq!(reply.exception_id(), Some("IDL:omg.org/CORBA/BAD_OPERATION:1.0"));
    assert_eq!(reply.minor_code(), Some(0x4F4D_0002));
    assert_eq!(reply.completion_status(), Some(CompletionStatus::Maybe));

    let mut ok = factory
        .create_reply(GiopVersion::V1_2, 6, ReplyBody::NoException, Vec::new())
        .unwrap()
        .with_body(vec![1, 2, 3, 4])
        .unwrap();
    let decoded = factory.parse_frame(&ok.to_bytes().unwrap()).unwrap();
    let Message::Reply(reply) = decoded else {
        panic!("expected a reply");
    };
    assert_eq!(reply.reply_status(), ReplyStatus::NoException);
    assert_eq!(reply.exception_id(), None);
    assert_eq!(reply.minor_code(), None);
    assert_eq!(reply.body, vec![1, 2, 3, 4]);
}

#[test]
fn test_locate_round_trip() {
    let factory = MessageFactory::default();
    let mut locate = factory
        .create_locate_request(GiopVersion::V1_1, 11, &key_target())
        .unwrap();
    let decoded = factory.parse_frame(&locate.to_bytes().unwrap()).unwrap();
    let Message::LocateRequest(locate) = decoded else {
        panic!("expected a locate request");
    };
    assert_eq!(locate.request_id, 11);

    let resolver = TargetResolver::new(AddressingPolicy::KeyAddr);
    assert_eq!(
        resolver.resolve_locate_request(&locate).unwrap(),
        ObjectKey::new(vec![1, 2])
    );

    let mut here = factory
        .create_locate_reply(GiopVersion::V1_2, 11, LocateReplyBody::ObjectHere)
        .unwrap();
    let frame = here.to_bytes().unwrap();
    // nothing follows the status, so no padding
    assert_eq!(frame.len(), 12 + 8);
    assert_eq!(factory.parse_frame(&frame).unwrap().request_id(), 11);
}

#[test]
fn test_profile_addressed_request_against_key_policy() {
    let profile = IiopProfile {
        iiop_version: GiopVersion::V1_2,
        host: "orb.local".to_string(),
        port: 2809,
        object_key: ObjectKey::new(b"Echo".to_vec()),
        components: Vec::new(),
    }
    .encode(ByteOrder::BigEndian)
    .unwrap();
    let mut target = key_target().with_addressing(AddressingDisposition::ProfileAddr);
    target.profile = profile;

    let factory = MessageFactory::default();
    let frame = factory
        .create_request(GiopVersion::V1_2, 6, &target, "echo", true, Vec::new())
        .unwrap()
        .to_bytes()
        .unwrap();
    let Message::Request(request) = factory.parse_frame(&frame).unwrap() else {
        panic!("expected a request");
    };

    assert_eq!(
        TargetResolver::new(AddressingPolicy::KeyAddr).resolve_request(&request),
        Err(ProtocolError::AddressingDisposition {
            expected: AddressingDisposition::KeyAddr,
            actual: AddressingDisposition::ProfileAddr,
        })
    );
    // the key comes out of the profile body, not the target's own key
    assert_eq!(
        TargetResolver::new(AddressingPolicy::HandleAll)
            .resolve_request(&request)
            .unwrap(),
        ObjectKey::new(b"Echo".to_vec())
    );
}

#[test]
fn test_partitioning_id_travels_in_flags() {
    let factory = MessageFactory::default();
    let target = key_target().with_component(partitioning_component(9, ByteOrder::BigEndian));
    let mut request = factory
        .create_request(GiopVersion::V1_2, 1, &target, "op", true, Vec::new())
        .unwrap();
    let frame = request.to_bytes().unwrap();

    assert_eq!(frame[6] >> 2, 9);
    let decoded = factory.parse_frame(&frame).unwrap();
    assert_eq!(decoded.request_partitioning_id(), 9);
    assert!(!decoded.more_fragments());
}

#[test]
fn test_version_admission() {
    let mut config = OrbConfig::default();
    config.giop.max_version = GiopVersion::V1_1;
    let factory = MessageFactory::from_config(&config);

    let newer = hex!("47494F50 0102 00 00 00000000");
    assert!(matches!(
        factory.parse_frame(&newer),
        Err(ProtocolError::VersionMismatch { .. })
    ));

    // MessageError is always admitted so the peer learns what went wrong
    let error = hex!("47494F50 0102 00 06 00000000");
    assert_eq!(
        factory.parse_frame(&error).unwrap().message_type(),
        MessageType::MessageError
    );
}

#[test]
fn test_truncated_frame_rejected() {
    let factory = MessageFactory::default();
    let mut request = factory
        .create_request(GiopVersion::V1_2, 1, &key_target(), "op", true, Vec::new())
        .unwrap();
    let frame = request.to_bytes().unwrap();
    assert!(matches!(
        factory.parse_frame(&frame[..frame.len() - 1]),
        Err(ProtocolError::MessageTooSmall { .. })
    ));
}

#[test]
fn test_java_encoding_frame() {
    let mut config = OrbConfig::default();
    config.giop.java_serialization = true;
    let factory = MessageFactory::from_config(&config);

    let mut request = factory
        .create_request(GiopVersion::V1_2, 3, &key_target(), "op", true, Vec::new())
        .unwrap()
        .with_encoding(EncodingVersion::JavaSerialization(1))
        .unwrap();
    let frame = request.to_bytes().unwrap();
    assert_eq!(&frame[4..6], &[0x0D, 0x01]);

    let decoded = factory.parse_frame(&frame).unwrap();
    assert_eq!(decoded.version(), GiopVersion::V1_2);
    assert_eq!(decoded.encoding(), EncodingVersion::JavaSerialization(1));

    let old = factory
        .create_request(GiopVersion::V1_1, 3, &key_target(), "op", true, Vec::new())
        .unwrap();
    assert!(matches!(
        old.with_encoding(EncodingVersion::JavaSerialization(1)),
        Err(ProtocolError::UnsupportedEncoding { .. })
    ));
}

#[test]
fn test_fragments_reparse_as_fragment_messages() {
    let factory = MessageFactory::default();
    let mut request = factory
        .create_request(GiopVersion::V1_2, 77, &key_target(), "upload", true, Vec::new())
        .unwrap()
        .with_body(vec![0x5A; 300])
        .unwrap();

    let frames = Fragmenter::new(128).split(&mut request).unwrap();
    assert!(frames.len() > 2);

    // header fields fit in the first frame, the arguments do not
    let mut first = factory.parse_frame(&frames[0]).unwrap();
    assert!(first.more_fragments());
    assert!(!first.is_incomplete());
    assert_eq!(first.request_id(), 77);

    for frame in &frames[1..] {
        let Message::Fragment(fragment) = factory.parse_frame(frame).unwrap() else {
            panic!("expected a fragment");
        };
        assert_eq!(fragment.request_id(), 77);
        first.append_fragment(&fragment).unwrap();
    }

    assert!(!first.more_fragments());
    assert_eq!(first.header().message_size, request.header().message_size);
    let Message::Request(whole) = first else {
        panic!("expected a request");
    };
    assert_eq!(whole.operation, "upload");
    assert_eq!(whole.body, vec![0x5A; 300]);
}

#[test]
fn test_first_fragment_ending_inside_header_fields() {
    let factory = MessageFactory::default();
    let operation = "a_rather_long_operation_name_here";
    let mut request = factory
        .create_request(GiopVersion::V1_2, 5, &key_target(), operation, true, Vec::new())
        .unwrap()
        .with_body(vec![0x11; 40])
        .unwrap();

    // 20 body bytes in the first frame: id, flags, target and no more
    let frames = Fragmenter::new(32).split(&mut request).unwrap();
    let mut first = factory.parse_frame(&frames[0]).unwrap();
    assert_eq!(first.message_type(), MessageType::Request);
    assert!(first.is_incomplete());
    assert_eq!(first.partial_body().map(<[u8]>::len), Some(20));
    assert_eq!(first.request_id(), 5);
    assert!(first.to_bytes().is_err());

    for frame in &frames[1..] {
        let Message::Fragment(fragment) = factory.parse_frame(frame).unwrap() else {
            panic!("expected a fragment");
        };
        first.append_fragment(&fragment).unwrap();
    }

    assert!(!first.is_incomplete());
    let Message::Request(whole) = first else {
        panic!("expected a request");
    };
    assert_eq!(whole.request_id, 5);
    assert_eq!(whole.operation, operation);
    assert_eq!(whole.object_key(), Some(&ObjectKey::new(vec![1, 2])));
    assert_eq!(whole.body, vec![0x11; 40]);
}

#[test]
fn test_first_fragment_1_1_reply_recovers_id_after_contexts() {
    let factory = MessageFactory::default();
    let contexts = vec![ServiceContext::new(0x1234, vec![7; 40])];
    let mut reply = factory
        .create_reply(GiopVersion::V1_1, 19, ReplyBody::NoException, contexts.clone())
        .unwrap()
        .with_body(vec![3; 16])
        .unwrap();

    let frames = Fragmenter::new(32).split(&mut reply).unwrap();
    let mut first = factory.parse_frame(&frames[0]).unwrap();
    // the service context data alone outgrows the first frame
    assert!(first.is_incomplete());
    assert_eq!(first.request_id(), -1);

    for frame in &frames[1..] {
        let Message::Fragment(fragment) = factory.parse_frame(frame).unwrap() else {
            panic!("expected a fragment");
        };
        assert_eq!(fragment.request_id(), -1);
        first.append_fragment(&fragment).unwrap();
    }
    let Message::Reply(whole) = first else {
        panic!("expected a reply");
    };
    assert_eq!(whole.request_id, 19);
    assert_eq!(whole.service_contexts, contexts);
    assert_eq!(whole.body, vec![3; 16]);
}

#[test]
fn test_fragment_for_another_request_rejected() {
    let factory = MessageFactory::default();
    let mut request = factory
        .create_request(GiopVersion::V1_2, 8, &key_target(), "op", true, Vec::new())
        .unwrap()
        .with_body(vec![0; 64])
        .unwrap();
    let frames = Fragmenter::new(64).split(&mut request).unwrap();
    let mut first = factory.parse_frame(&frames[0]).unwrap();

    let stray = factory
        .create_request(GiopVersion::V1_2, 9, &key_target(), "op", true, Vec::new())
        .unwrap()
        .create_fragment_message()
        .unwrap();
    let Message::Fragment(stray) = stray else {
        panic!("expected a fragment");
    };
    assert!(matches!(
        first.append_fragment(&stray),
        Err(ProtocolError::Marshal { .. })
    ));

    let mut complete = factory.create_cancel_request(GiopVersion::V1_2, 8).unwrap();
    assert!(complete.append_fragment(&stray).is_err());
}

#[test]
fn test_create_fragment_message_1_1_keeps_id_locally() {
    let factory = MessageFactory::default();
    let request = factory
        .create_request(GiopVersion::V1_1, 15, &key_target(), "op", true, Vec::new())
        .unwrap();

    let mut fragment = request.create_fragment_message().unwrap();
    assert_eq!(fragment.request_id(), -1);
    let Message::Fragment(inner) = &fragment else {
        panic!("expected a fragment");
    };
    assert_eq!(inner.correlated_request_id, Some(15));

    // nothing but the payload is written for 1.1
    fragment = fragment.with_body(vec![1, 2, 3]).unwrap();
    assert_eq!(fragment.to_bytes().unwrap().len(), 12 + 3);

    let cancel = factory.create_cancel_request(GiopVersion::V1_2, 1).unwrap();
    assert!(matches!(
        cancel.create_fragment_message(),
        Err(ProtocolError::FragmentationDisallowed { .. })
    ));
}

#[test]
fn test_fragmentation_table_matches_policy() {
    let policy = VersionPolicy::default();
    let allowed_1_1 = [MessageType::Request, MessageType::Reply, MessageType::Fragment];
    for message_type in MessageType::ALL {
        assert!(!policy.allows_fragmentation(GiopVersion::V1_0, message_type));
        assert_eq!(
            policy.allows_fragmentation(GiopVersion::V1_1, message_type),
            allowed_1_1.contains(&message_type)
        );
        assert_eq!(
            policy.allows_fragmentation(GiopVersion::V1_2, message_type),
            !matches!(
                message_type,
                MessageType::CancelRequest
                    | MessageType::CloseConnection
                    | MessageType::MessageError
            )
        );
    }
}

#[derive(Default)]
struct KindCounter {
    seen: Vec<&'static str>,
}

impl MessageHandler for KindCounter {
    type Output = i32;

    fn handle_request(&mut self, message: &RequestMessage) -> i32 {
        self.seen.push("request");
        message.request_id as i32
    }

    fn handle_reply(&mut self, message: &ReplyMessage) -> i32 {
        self.seen.push("reply");
        message.request_id as i32
    }

    fn handle_cancel_request(&mut self, message: &CancelRequestMessage) -> i32 {
        self.seen.push("cancel");
        message.request_id as i32
    }

    fn handle_locate_request(&mut self, message: &LocateRequestMessage) -> i32 {
        self.seen.push("locate_request");
        message.request_id as i32
    }

    fn handle_locate_reply(&mut self, message: &LocateReplyMessage) -> i32 {
        self.seen.push("locate_reply");
        message.request_id as i32
    }

    fn handle_close_connection(&mut self, _message: &ControlMessage) -> i32 {
        self.seen.push("close");
        -1
    }

    fn handle_message_error(&mut self, _message: &ControlMessage) -> i32 {
        self.seen.push("error");
        -1
    }

    fn handle_fragment(&mut self, message: &FragmentMessage) -> i32 {
        self.seen.push("fragment");
        message.request_id()
    }
}

#[test]
fn test_dispatch_reaches_each_handler() {
    let factory = MessageFactory::default();
    let v = GiopVersion::V1_2;
    let messages = vec![
        factory
            .create_request(v, 1, &key_target(), "op", true, Vec::new())
            .unwrap(),
        factory
            .create_reply(v, 2, ReplyBody::NoException, Vec::new())
            .unwrap(),
        factory.create_cancel_request(v, 3).unwrap(),
        factory.create_locate_request(v, 4, &key_target()).unwrap(),
        factory
            .create_locate_reply(v, 5, LocateReplyBody::UnknownObject)
            .unwrap(),
        factory.create_close_connection(v).unwrap(),
        factory.create_message_error(v).unwrap(),
        factory.create_fragment(v, 8, false).unwrap(),
    ];

    let mut counter = KindCounter::default();
    let ids: Vec<i32> = messages.iter().map(|m| m.dispatch(&mut counter)).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5, -1, -1, 8]);
    assert_eq!(
        counter.seen,
        vec![
            "request",
            "reply",
            "cancel",
            "locate_request",
            "locate_reply",
            "close",
            "error",
            "fragment"
        ]
    );
}

//! # Message Factory
//!
//! Builds [`Message`] values in both directions:
//!
//! - **Inbound**: [`MessageFactory::create_from_header`] picks the empty
//!   shell for a validated header; [`MessageFactory::decode`] also fills it
//!   from the body bytes.
//! - **Outbound**: one constructor per message kind. Each checks the
//!   version against the local maximum, stamps the configured byte order
//!   and leaves the size at zero until [`Message::to_bytes`] patches it.

use crate::error::{ProtocolError, ProtocolResult};
use crate::header::HeaderCodec;
use crate::messages::{
    CancelRequestMessage, ControlMessage, FragmentMessage, LocateReplyBody, LocateReplyMessage,
    LocateRequestMessage, Message, ReplyBody, ReplyMessage, RequestMessage,
};
use crate::partitioning::select_partitioning_id;
use crate::policy::VersionPolicy;
use giop_config::{OrbConfig, PartitioningSettings};
use giop_types::{
    ByteOrder, CommonHeader, EncodingVersion, GiopVersion, InvocationTarget, MessageType,
    Revision, ServiceContext, TargetAddress,
};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct MessageFactory {
    codec: HeaderCodec,
    policy: VersionPolicy,
    byte_order: ByteOrder,
    partitioning: PartitioningSettings,
}

impl Default for MessageFactory {
    fn default() -> Self {
        Self::from_config(&OrbConfig::default())
    }
}

impl MessageFactory {
    pub fn new(
        codec: HeaderCodec,
        policy: VersionPolicy,
        byte_order: ByteOrder,
        partitioning: PartitioningSettings,
    ) -> Self {
        Self {
            codec,
            policy,
            byte_order,
            partitioning,
        }
    }

    pub fn from_config(config: &OrbConfig) -> Self {
        Self::new(
            HeaderCodec::from_config(&config.giop),
            VersionPolicy::from_config(&config.giop),
            config.giop.byte_order,
            config.partitioning.clone(),
        )
    }

    pub fn header_codec(&self) -> &HeaderCodec {
        &self.codec
    }

    pub fn policy(&self) -> &VersionPolicy {
        &self.policy
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Empty message for a header that passed validation
    ///
    /// CloseConnection and MessageError accept any 1.x version so that a
    /// peer negotiating down can still be understood.
    pub fn create_from_header(
        &self,
        header: CommonHeader,
        encoding: EncodingVersion,
    ) -> ProtocolResult<Message> {
        let mismatch =
            || ProtocolError::version_mismatch(header.version, self.policy.max_version(), header.message_type);

        match (header.version.revision(), header.message_type) {
            (_, MessageType::CloseConnection) => {
                if header.version.major != 1 {
                    return Err(mismatch());
                }
                Ok(Message::CloseConnection(ControlMessage::shell(header)))
            }
            (_, MessageType::MessageError) => {
                if header.version.major != 1 {
                    return Err(mismatch());
                }
                Ok(Message::MessageError(ControlMessage::shell(header)))
            }
            (None, _) => Err(mismatch()),
            (Some(revision), MessageType::Request) => Ok(Message::Request(
                RequestMessage::shell(header, revision, encoding),
            )),
            (Some(revision), MessageType::Reply) => Ok(Message::Reply(ReplyMessage::shell(
                header, revision, encoding,
            ))),
            (Some(revision), MessageType::CancelRequest) => Ok(Message::CancelRequest(
                CancelRequestMessage::shell(header, revision, encoding),
            )),
            (Some(revision), MessageType::LocateRequest) => Ok(Message::LocateRequest(
                LocateRequestMessage::shell(header, revision, encoding),
            )),
            (Some(revision), MessageType::LocateReply) => Ok(Message::LocateReply(
                LocateReplyMessage::shell(header, revision, encoding),
            )),
            (Some(Revision::V1_0), MessageType::Fragment) => {
                Err(ProtocolError::fragmentation_disallowed(
                    header.version,
                    header.message_type,
                    "GIOP 1.0 has no Fragment message",
                ))
            }
            (Some(revision @ (Revision::V1_1 | Revision::V1_2)), MessageType::Fragment) => Ok(
                Message::Fragment(FragmentMessage::shell(header, revision, encoding)),
            ),
        }
    }

    /// Shell plus body decode
    pub fn decode(
        &self,
        header: CommonHeader,
        encoding: EncodingVersion,
        body: &[u8],
    ) -> ProtocolResult<Message> {
        let mut message = self.create_from_header(header, encoding)?;
        message.read_body(body)?;
        Ok(message)
    }

    /// Parse, validate and decode one complete frame held in memory
    pub fn parse_frame(&self, frame: &[u8]) -> ProtocolResult<Message> {
        let (header, encoding) = self.codec.parse(frame)?;
        self.policy.validate_header(&header)?;

        let total = header.message_size as usize;
        if frame.len() < total {
            return Err(ProtocolError::message_too_small(
                total,
                frame.len(),
                "frame shorter than its size field",
            ));
        }
        self.decode(header, encoding, &frame[CommonHeader::SIZE..total])
    }

    fn outbound_header(
        &self,
        version: GiopVersion,
        message_type: MessageType,
    ) -> ProtocolResult<(CommonHeader, Revision)> {
        let revision = version
            .revision()
            .filter(|_| version <= self.policy.max_version())
            .ok_or_else(|| {
                ProtocolError::version_mismatch(version, self.policy.max_version(), message_type)
            })?;
        Ok((
            CommonHeader::new(version, message_type, self.byte_order),
            revision,
        ))
    }

    /// Outbound request
    ///
    /// GIOP 1.0/1.1 address the target by object key; 1.2 uses the
    /// target's negotiated addressing disposition. The request partitioning
    /// id from the target profile is packed into the header flags.
    pub fn create_request(
        &self,
        version: GiopVersion,
        request_id: u32,
        target: &InvocationTarget,
        operation: &str,
        response_expected: bool,
        service_contexts: Vec<ServiceContext>,
    ) -> ProtocolResult<Message> {
        let (mut header, revision) = self.outbound_header(version, MessageType::Request)?;
        let partitioning_id =
            select_partitioning_id(&self.partitioning, &self.policy, version, target)?;
        if self.policy.supports_request_partitioning(version) {
            header.set_thread_pool_id(partitioning_id);
        }

        let mut request = RequestMessage::shell(header, revision, EncodingVersion::Cdr);
        request.request_id = request_id;
        request.set_response_expected(response_expected);
        request.target = target_for(revision, target);
        request.operation = operation.to_string();
        request.service_contexts = service_contexts;

        debug!(
            request_id,
            version = %version,
            operation,
            partitioning_id,
            "created request"
        );
        Ok(Message::Request(request))
    }

    pub fn create_reply(
        &self,
        version: GiopVersion,
        request_id: u32,
        reply: ReplyBody,
        service_contexts: Vec<ServiceContext>,
    ) -> ProtocolResult<Message> {
        let (header, revision) = self.outbound_header(version, MessageType::Reply)?;
        let status = reply.status();
        if !status.is_defined_for(version) {
            return Err(ProtocolError::InvalidReplyStatus {
                kind: "reply",
                status: status as u32,
                version,
            });
        }

        let mut message = ReplyMessage::shell(header, revision, EncodingVersion::Cdr);
        message.request_id = request_id;
        message.reply = reply;
        message.service_contexts = service_contexts;
        Ok(Message::Reply(message))
    }

    pub fn create_locate_request(
        &self,
        version: GiopVersion,
        request_id: u32,
        target: &InvocationTarget,
    ) -> ProtocolResult<Message> {
        let (header, revision) = self.outbound_header(version, MessageType::LocateRequest)?;
        let mut message = LocateRequestMessage::shell(header, revision, EncodingVersion::Cdr);
        message.request_id = request_id;
        message.target = target_for(revision, target);
        Ok(Message::LocateRequest(message))
    }

    pub fn create_locate_reply(
        &self,
        version: GiopVersion,
        request_id: u32,
        reply: LocateReplyBody,
    ) -> ProtocolResult<Message> {
        let (header, revision) = self.outbound_header(version, MessageType::LocateReply)?;
        let status = reply.status();
        if !status.is_defined_for(version) {
            return Err(ProtocolError::InvalidReplyStatus {
                kind: "locate",
                status: status as u32,
                version,
            });
        }

        let mut message = LocateReplyMessage::shell(header, revision, EncodingVersion::Cdr);
        message.request_id = request_id;
        message.reply = reply;
        Ok(Message::LocateReply(message))
    }

    pub fn create_cancel_request(
        &self,
        version: GiopVersion,
        request_id: u32,
    ) -> ProtocolResult<Message> {
        let (header, revision) = self.outbound_header(version, MessageType::CancelRequest)?;
        let mut message = CancelRequestMessage::shell(header, revision, EncodingVersion::Cdr);
        message.request_id = request_id;
        Ok(Message::CancelRequest(message))
    }

    pub fn create_close_connection(&self, version: GiopVersion) -> ProtocolResult<Message> {
        let (header, _) = self.outbound_header(version, MessageType::CloseConnection)?;
        Ok(Message::CloseConnection(ControlMessage::shell(header)))
    }

    pub fn create_message_error(&self, version: GiopVersion) -> ProtocolResult<Message> {
        let (header, _) = self.outbound_header(version, MessageType::MessageError)?;
        Ok(Message::MessageError(ControlMessage::shell(header)))
    }

    /// Standalone fragment continuing `request_id`
    pub fn create_fragment(
        &self,
        version: GiopVersion,
        request_id: u32,
        more_fragments: bool,
    ) -> ProtocolResult<Message> {
        let (mut header, revision) = self.outbound_header(version, MessageType::Fragment)?;
        if revision == Revision::V1_0 {
            return Err(ProtocolError::fragmentation_disallowed(
                version,
                MessageType::Fragment,
                "GIOP 1.0 has no Fragment message",
            ));
        }
        header.set_more_fragments(more_fragments);

        let mut fragment = FragmentMessage::shell(header, revision, EncodingVersion::Cdr);
        fragment.set_request_id(request_id);
        Ok(Message::Fragment(fragment))
    }
}

fn target_for(revision: Revision, target: &InvocationTarget) -> TargetAddress {
    match revision {
        Revision::V1_0 | Revision::V1_1 => TargetAddress::Key(target.object_key.clone()),
        Revision::V1_2 => target.target_address(),
    }
}

//! # GIOP Message Variants
//!
//! [`Message`] is the closed set of message kinds. Each variant owns its
//! common header, the body encoding announced by the header, and the
//! kind-specific fields. Version differences live inside each kind's body
//! codec and are matched on [`giop_types::Revision`], so every per-version
//! path is checked for exhaustiveness by the compiler.
//!
//! Inbound messages start as empty shells built from a header and are
//! filled by [`Message::read_body`]. A first fragment may end before the
//! header fields do; its raw body is then kept and the message stays
//! incomplete until [`Message::append_fragment`] supplies the rest.
//! Outbound messages are built by
//! [`crate::MessageFactory`] with a zero size and serialized with
//! [`Message::to_bytes`], which patches the size field after the body is
//! known.

mod control;
pub(crate) mod fields;
mod fragment;
mod locate;
mod reply;
mod request;

pub use control::{CancelRequestMessage, ControlMessage};
pub use fragment::FragmentMessage;
pub use locate::{LocateReplyBody, LocateReplyMessage, LocateRequestMessage};
pub use reply::{ReplyBody, ReplyMessage};
pub use request::RequestMessage;

use crate::cdr::CdrReader;
use crate::dispatch::MessageHandler;
use crate::error::{ProtocolError, ProtocolResult};
use crate::header::HeaderCodec;
use crate::policy::{unmarshal_request_id, VersionPolicy};
use crate::size::patch_size;
use giop_types::{
    CommonHeader, EncodingVersion, GiopVersion, MessageType, Revision,
    BYTE_ORDER_AND_FRAGMENT_MASK, JAVA_ENC_MARKER, JAVA_ENC_VERSION,
};
use tracing::trace;

/// Body bytes received so far for a message whose header fields continue
/// in later fragments
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PartialBody {
    bytes: Vec<u8>,
    /// Recovered from the raw bytes when they reach far enough
    request_id: Option<u32>,
}

/// One GIOP message of any kind
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Request(RequestMessage),
    Reply(ReplyMessage),
    CancelRequest(CancelRequestMessage),
    LocateRequest(LocateRequestMessage),
    LocateReply(LocateReplyMessage),
    CloseConnection(ControlMessage),
    MessageError(ControlMessage),
    Fragment(FragmentMessage),
}

impl Message {
    pub fn header(&self) -> &CommonHeader {
        match self {
            Message::Request(m) => &m.header,
            Message::Reply(m) => &m.header,
            Message::CancelRequest(m) => &m.header,
            Message::LocateRequest(m) => &m.header,
            Message::LocateReply(m) => &m.header,
            Message::CloseConnection(m) | Message::MessageError(m) => &m.header,
            Message::Fragment(m) => &m.header,
        }
    }

    pub(crate) fn header_mut(&mut self) -> &mut CommonHeader {
        match self {
            Message::Request(m) => &mut m.header,
            Message::Reply(m) => &mut m.header,
            Message::CancelRequest(m) => &mut m.header,
            Message::LocateRequest(m) => &mut m.header,
            Message::LocateReply(m) => &mut m.header,
            Message::CloseConnection(m) | Message::MessageError(m) => &mut m.header,
            Message::Fragment(m) => &mut m.header,
        }
    }

    pub fn version(&self) -> GiopVersion {
        self.header().version
    }

    pub fn message_type(&self) -> MessageType {
        self.header().message_type
    }

    /// Body encoding; header-only messages are always CDR
    pub fn encoding(&self) -> EncodingVersion {
        match self {
            Message::Request(m) => m.encoding,
            Message::Reply(m) => m.encoding,
            Message::CancelRequest(m) => m.encoding,
            Message::LocateRequest(m) => m.encoding,
            Message::LocateReply(m) => m.encoding,
            Message::CloseConnection(_) | Message::MessageError(_) => EncodingVersion::Cdr,
            Message::Fragment(m) => m.encoding,
        }
    }

    /// Switch the body encoding of an outbound GIOP 1.2 message
    pub fn with_encoding(mut self, encoding: EncodingVersion) -> ProtocolResult<Self> {
        if let EncodingVersion::JavaSerialization(n) = encoding {
            if self.version() != GiopVersion::V1_2 || n == 0 || n > JAVA_ENC_VERSION {
                return Err(ProtocolError::UnsupportedEncoding {
                    marker: JAVA_ENC_MARKER,
                    encoding_version: n,
                    max_supported: JAVA_ENC_VERSION,
                    enabled: true,
                });
            }
        }
        match &mut self {
            Message::Request(m) => m.encoding = encoding,
            Message::Reply(m) => m.encoding = encoding,
            Message::CancelRequest(m) => m.encoding = encoding,
            Message::LocateRequest(m) => m.encoding = encoding,
            Message::LocateReply(m) => m.encoding = encoding,
            Message::Fragment(m) => m.encoding = encoding,
            Message::CloseConnection(_) | Message::MessageError(_) => {
                if !encoding.is_cdr() {
                    return Err(ProtocolError::UnsupportedEncoding {
                        marker: JAVA_ENC_MARKER,
                        encoding_version: 0,
                        max_supported: JAVA_ENC_VERSION,
                        enabled: true,
                    });
                }
            }
        }
        Ok(self)
    }

    /// Attach the opaque payload: Request arguments, Reply result or
    /// Fragment continuation bytes
    pub fn with_body(mut self, body: Vec<u8>) -> ProtocolResult<Self> {
        match &mut self {
            Message::Request(m) => m.body = body,
            Message::Reply(m) => m.body = body,
            Message::Fragment(m) => m.payload = body,
            other => {
                return Err(ProtocolError::marshal(
                    0,
                    format!("{} carries no opaque payload", other.message_type().name()),
                ))
            }
        }
        Ok(self)
    }

    /// Request id of the message, or -1 for kinds without one
    ///
    /// CloseConnection and MessageError never carry an id; neither does a
    /// GIOP 1.1 fragment on the wire, nor an incomplete message whose id
    /// lies beyond its first fragment.
    pub fn request_id(&self) -> i32 {
        if let Some(partial) = self.partial() {
            return partial.request_id.map_or(-1, |id| id as i32);
        }
        match self {
            Message::Request(m) => m.request_id as i32,
            Message::Reply(m) => m.request_id as i32,
            Message::CancelRequest(m) => m.request_id as i32,
            Message::LocateRequest(m) => m.request_id as i32,
            Message::LocateReply(m) => m.request_id as i32,
            Message::CloseConnection(_) | Message::MessageError(_) => -1,
            Message::Fragment(m) => m.request_id(),
        }
    }

    /// Request partitioning (thread pool) id carried in the flags byte
    ///
    /// Zero for versions without the extension.
    pub fn request_partitioning_id(&self) -> u8 {
        let header = self.header();
        if VersionPolicy::default().supports_request_partitioning(header.version) {
            header.thread_pool_id()
        } else {
            0
        }
    }

    pub fn more_fragments(&self) -> bool {
        self.header().more_fragments()
    }

    pub fn set_more_fragments(&mut self, more: bool) {
        self.header_mut().set_more_fragments(more);
    }

    /// Whether the header fields are still waiting for later fragments
    pub fn is_incomplete(&self) -> bool {
        self.partial().is_some()
    }

    /// Raw body bytes kept while the message is incomplete
    pub fn partial_body(&self) -> Option<&[u8]> {
        self.partial().map(|partial| partial.bytes.as_slice())
    }

    fn partial(&self) -> Option<&PartialBody> {
        match self {
            Message::Request(m) => m.partial.as_ref(),
            Message::Reply(m) => m.partial.as_ref(),
            Message::LocateRequest(m) => m.partial.as_ref(),
            Message::LocateReply(m) => m.partial.as_ref(),
            Message::CancelRequest(_)
            | Message::CloseConnection(_)
            | Message::MessageError(_)
            | Message::Fragment(_) => None,
        }
    }

    fn take_partial(&mut self) -> Option<PartialBody> {
        match self {
            Message::Request(m) => m.partial.take(),
            Message::Reply(m) => m.partial.take(),
            Message::LocateRequest(m) => m.partial.take(),
            Message::LocateReply(m) => m.partial.take(),
            Message::CancelRequest(_)
            | Message::CloseConnection(_)
            | Message::MessageError(_)
            | Message::Fragment(_) => None,
        }
    }

    /// Keep `partial` and expose the request id it yielded
    fn stash_partial(&mut self, partial: PartialBody) {
        let request_id = partial.request_id.unwrap_or_default();
        match self {
            Message::Request(m) => {
                m.request_id = request_id;
                m.partial = Some(partial);
            }
            Message::Reply(m) => {
                m.request_id = request_id;
                m.partial = Some(partial);
            }
            Message::LocateRequest(m) => {
                m.request_id = request_id;
                m.partial = Some(partial);
            }
            Message::LocateReply(m) => {
                m.request_id = request_id;
                m.partial = Some(partial);
            }
            Message::CancelRequest(_)
            | Message::CloseConnection(_)
            | Message::MessageError(_)
            | Message::Fragment(_) => {}
        }
    }

    /// A fragmentable kind announcing further fragments may end its first
    /// frame anywhere, header fields included
    fn continues_in_fragments(&self) -> bool {
        let header = self.header();
        header.more_fragments()
            && header.message_type != MessageType::Fragment
            && VersionPolicy::default().allows_fragmentation(header.version, header.message_type)
    }

    /// Request id from a body the decoder could not finish
    fn recover_request_id(&self, body: &[u8]) -> Option<u32> {
        let header = self.header();
        if VersionPolicy::default().request_id_leads_body(header.version, header.message_type) {
            return unmarshal_request_id(body, header.byte_order()).ok();
        }
        // 1.0 and 1.1 Request/Reply: the id follows the service contexts
        let mut r = CdrReader::for_body(body, header.byte_order());
        fields::read_service_contexts(&mut r).ok()?;
        r.read_ulong().ok()
    }

    /// Decode the body of an inbound shell
    ///
    /// When more fragments follow and the body ends before the header
    /// fields do, the raw bytes are kept instead and the message is
    /// reported as incomplete.
    pub fn read_body(&mut self, body: &[u8]) -> ProtocolResult<()> {
        let decoded = match self {
            Message::Request(m) => m.read_body(body),
            Message::Reply(m) => m.read_body(body),
            Message::CancelRequest(m) => m.read_body(body),
            Message::LocateRequest(m) => m.read_body(body),
            Message::LocateReply(m) => m.read_body(body),
            Message::CloseConnection(m) | Message::MessageError(m) => m.read_body(body),
            Message::Fragment(m) => m.read_body(body),
        };
        match decoded {
            Ok(()) => {
                self.take_partial();
                Ok(())
            }
            Err(err) if self.continues_in_fragments() => {
                let request_id = self.recover_request_id(body);
                trace!(
                    error = %err,
                    request_id = ?request_id,
                    received = body.len(),
                    "header fields continue in a later fragment"
                );
                self.stash_partial(PartialBody {
                    bytes: body.to_vec(),
                    request_id,
                });
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Append the payload of the Fragment that continues this message
    ///
    /// An incomplete message is decoded again over everything received so
    /// far; a complete one grows its opaque body. The more-fragments bit and
    /// the recorded size follow the fragment.
    pub fn append_fragment(&mut self, fragment: &FragmentMessage) -> ProtocolResult<()> {
        let header = *self.header();
        if !header.more_fragments() {
            return Err(ProtocolError::marshal(
                0,
                format!("{} expects no further fragments", header.message_type),
            ));
        }
        if fragment.header.version != header.version {
            return Err(ProtocolError::marshal(
                0,
                format!(
                    "GIOP {} fragment cannot continue a GIOP {} {}",
                    fragment.header.version, header.version, header.message_type
                ),
            ));
        }
        let expected = self.request_id();
        if fragment.revision == Revision::V1_2 && expected >= 0 && fragment.request_id() != expected
        {
            return Err(ProtocolError::marshal(
                0,
                format!(
                    "fragment for request {} does not continue request {}",
                    fragment.request_id(),
                    expected
                ),
            ));
        }

        {
            let own = self.header_mut();
            own.set_more_fragments(fragment.more_fragments());
            own.message_size = own
                .message_size
                .saturating_add(fragment.payload.len() as u32);
        }

        if let Some(mut partial) = self.take_partial() {
            partial.bytes.extend_from_slice(&fragment.payload);
            return self.read_body(&partial.bytes);
        }
        match self {
            Message::Request(m) => m.body.extend_from_slice(&fragment.payload),
            Message::Reply(m) => m.body.extend_from_slice(&fragment.payload),
            // locate fields were complete; nothing opaque follows them
            Message::LocateRequest(_) | Message::LocateReply(_) => {}
            Message::CancelRequest(_)
            | Message::CloseConnection(_)
            | Message::MessageError(_)
            | Message::Fragment(_) => {}
        }
        Ok(())
    }

    /// Serialize the body; alignment assumes it follows a 12-byte header
    pub fn write_body(&self) -> ProtocolResult<Vec<u8>> {
        if let Some(partial) = self.partial() {
            return Err(ProtocolError::marshal(
                partial.bytes.len(),
                format!(
                    "{} is incomplete: header fields continue in later fragments",
                    self.message_type()
                ),
            ));
        }
        match self {
            Message::Request(m) => m.write_body(),
            Message::Reply(m) => m.write_body(),
            Message::CancelRequest(m) => m.write_body(),
            Message::LocateRequest(m) => m.write_body(),
            Message::LocateReply(m) => m.write_body(),
            Message::CloseConnection(_) | Message::MessageError(_) => Ok(Vec::new()),
            Message::Fragment(m) => m.write_body(),
        }
    }

    /// Serialize header and body and patch the size field
    ///
    /// The header is written with a placeholder size, the body appended and
    /// the size patched once the total is known. The message's own header
    /// records the final size.
    pub fn to_bytes(&mut self) -> ProtocolResult<Vec<u8>> {
        let body = self.write_body()?;
        let mut buf = Vec::with_capacity(CommonHeader::SIZE + body.len());
        buf.extend_from_slice(&HeaderCodec::write(self.header(), self.encoding()));
        buf.extend_from_slice(&body);

        let total = buf.len();
        patch_size(&mut buf, total)?;
        self.header_mut().message_size = total as u32;
        Ok(buf)
    }

    /// Create the next Fragment for this message
    ///
    /// The fragment keeps the version and byte order (flags & 0x03) and
    /// continues the same request id: on the wire for 1.2, locally for 1.1.
    pub fn create_fragment_message(&self) -> ProtocolResult<Message> {
        let header = self.header();
        let policy = VersionPolicy::default();
        if !policy.allows_fragmentation(header.version, header.message_type) {
            return Err(ProtocolError::fragmentation_disallowed(
                header.version,
                header.message_type,
                "cannot create a fragment for this message",
            ));
        }
        let revision = match header.version.revision() {
            Some(revision @ (Revision::V1_1 | Revision::V1_2)) => revision,
            Some(Revision::V1_0) | None => {
                return Err(ProtocolError::fragmentation_disallowed(
                    header.version,
                    header.message_type,
                    "version has no fragments",
                ))
            }
        };

        let fragment_header = CommonHeader {
            version: header.version,
            flags: header.flags & BYTE_ORDER_AND_FRAGMENT_MASK,
            message_type: MessageType::Fragment,
            message_size: 0,
        };
        let mut fragment = FragmentMessage::shell(fragment_header, revision, self.encoding());
        match self {
            Message::Fragment(previous) => {
                fragment.wire_request_id = previous.wire_request_id;
                fragment.correlated_request_id = previous.correlated_request_id;
            }
            _ => fragment.set_request_id(self.request_id() as u32),
        }
        Ok(Message::Fragment(fragment))
    }

    /// Hand the message to the handler method for its kind
    pub fn dispatch<H: MessageHandler + ?Sized>(&self, handler: &mut H) -> H::Output {
        match self {
            Message::Request(m) => handler.handle_request(m),
            Message::Reply(m) => handler.handle_reply(m),
            Message::CancelRequest(m) => handler.handle_cancel_request(m),
            Message::LocateRequest(m) => handler.handle_locate_request(m),
            Message::LocateReply(m) => handler.handle_locate_reply(m),
            Message::CloseConnection(m) => handler.handle_close_connection(m),
            Message::MessageError(m) => handler.handle_message_error(m),
            Message::Fragment(m) => handler.handle_fragment(m),
        }
    }
}

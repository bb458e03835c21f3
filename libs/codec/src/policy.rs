//! Per-version protocol rules
//!
//! `VersionPolicy` is a pure rule table: it holds the highest version this
//! side speaks and the largest frame it accepts, and answers questions
//! about admission, fragmentation and where the request id lives. It never
//! mutates anything.

use crate::error::{ProtocolError, ProtocolResult};
use byteorder::{BigEndian, ByteOrder as Endianness, LittleEndian};
use giop_config::defaults::giop::MAX_MESSAGE_SIZE;
use giop_config::GiopSettings;
use giop_types::{
    ByteOrder, CommonHeader, GiopVersion, MessageType, Revision, FRAGMENT_1_2_HEADER_SIZE,
    GIOP_HEADER_SIZE, REQUEST_ID_SIZE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionPolicy {
    max_version: GiopVersion,
    max_message_size: u32,
}

impl Default for VersionPolicy {
    fn default() -> Self {
        Self::new(GiopVersion::V1_2)
    }
}

impl VersionPolicy {
    pub fn new(max_version: GiopVersion) -> Self {
        Self {
            max_version,
            max_message_size: MAX_MESSAGE_SIZE,
        }
    }

    pub fn from_config(settings: &GiopSettings) -> Self {
        Self::new(settings.max_version).with_max_message_size(settings.max_message_size)
    }

    pub fn with_max_message_size(mut self, max_message_size: u32) -> Self {
        self.max_message_size = max_message_size;
        self
    }

    pub fn max_version(&self) -> GiopVersion {
        self.max_version
    }

    pub fn max_message_size(&self) -> u32 {
        self.max_message_size
    }

    /// Version admission
    ///
    /// Anything newer than the local maximum, or outside the implemented
    /// revisions, is rejected. MessageError is always admitted so the peer's
    /// downgrade negotiation can proceed.
    pub fn admit(&self, header: &CommonHeader) -> ProtocolResult<()> {
        if header.message_type == MessageType::MessageError {
            return Ok(());
        }
        if header.version > self.max_version || header.version.revision().is_none() {
            return Err(ProtocolError::version_mismatch(
                header.version,
                self.max_version,
                header.message_type,
            ));
        }
        Ok(())
    }

    /// Whether `message_type` may be split into fragments in `version`
    ///
    /// For `Fragment` itself this answers whether the type exists and may
    /// announce further fragments.
    pub fn allows_fragmentation(&self, version: GiopVersion, message_type: MessageType) -> bool {
        let Some(revision) = version.revision() else {
            return false;
        };
        match (revision, message_type) {
            (Revision::V1_0, _) => false,
            (Revision::V1_1, MessageType::Request | MessageType::Reply | MessageType::Fragment) => {
                true
            }
            (
                Revision::V1_2,
                MessageType::Request
                | MessageType::Reply
                | MessageType::LocateRequest
                | MessageType::LocateReply
                | MessageType::Fragment,
            ) => true,
            (Revision::V1_1, MessageType::LocateRequest | MessageType::LocateReply) => false,
            (
                Revision::V1_1 | Revision::V1_2,
                MessageType::CancelRequest
                | MessageType::CloseConnection
                | MessageType::MessageError,
            ) => false,
        }
    }

    /// Fragmentation legality of an inbound header
    ///
    /// A Fragment frame is illegal in 1.0. A more-fragments bit is illegal on
    /// any type that may not be fragmented in the header's version.
    pub fn check_fragmentation(&self, header: &CommonHeader) -> ProtocolResult<()> {
        if header.message_type == MessageType::Fragment
            && !self.allows_fragmentation(header.version, MessageType::Fragment)
        {
            return Err(ProtocolError::fragmentation_disallowed(
                header.version,
                header.message_type,
                "Fragment message in a version without fragmentation",
            ));
        }
        if header.more_fragments()
            && !self.allows_fragmentation(header.version, header.message_type)
        {
            return Err(ProtocolError::fragmentation_disallowed(
                header.version,
                header.message_type,
                "more-fragments flag set",
            ));
        }
        Ok(())
    }

    /// Reject a frame announcing more bytes than the configured cap
    pub fn check_size(&self, header: &CommonHeader) -> ProtocolResult<()> {
        if header.message_size > self.max_message_size {
            return Err(ProtocolError::MessageTooLarge {
                size: header.message_size as usize,
                max: self.max_message_size as usize,
            });
        }
        Ok(())
    }

    /// Every header-phase check: admission, fragmentation legality, size cap
    pub fn validate_header(&self, header: &CommonHeader) -> ProtocolResult<()> {
        self.admit(header)?;
        self.check_fragmentation(header)?;
        self.check_size(header)
    }

    /// Whether the request id is the first four body bytes
    ///
    /// True for every GIOP 1.2 message that carries one. In 1.0 and 1.1 the
    /// id sits after the service contexts and only the body decoder finds it.
    pub fn request_id_leads_body(&self, version: GiopVersion, message_type: MessageType) -> bool {
        version.revision() == Some(Revision::V1_2)
            && !matches!(
                message_type,
                MessageType::CloseConnection | MessageType::MessageError
            )
    }

    /// The request partitioning extension needs the flag bits 1.0 lacks
    pub fn supports_request_partitioning(&self, version: GiopVersion) -> bool {
        matches!(version.revision(), Some(Revision::V1_1 | Revision::V1_2))
    }

    /// GIOP 1.2 bodies that follow request/reply header fields start on an
    /// 8-octet boundary
    pub fn aligns_body(&self, version: GiopVersion) -> bool {
        version.revision() == Some(Revision::V1_2)
    }

    /// Bytes before the payload of a Fragment frame
    pub fn fragment_header_size(&self, version: GiopVersion) -> usize {
        match version.revision() {
            Some(Revision::V1_2) => FRAGMENT_1_2_HEADER_SIZE,
            _ => GIOP_HEADER_SIZE,
        }
    }
}

/// Read the GIOP 1.2 request id from the first four body bytes
///
/// A server needs the id before the full body decoder can run, for example
/// to answer a request whose body fails to decode.
pub fn unmarshal_request_id(body: &[u8], byte_order: ByteOrder) -> ProtocolResult<u32> {
    if body.len() < REQUEST_ID_SIZE {
        return Err(ProtocolError::message_too_small(
            REQUEST_ID_SIZE,
            body.len(),
            "GIOP 1.2 request id",
        ));
    }
    let id_bytes = &body[..REQUEST_ID_SIZE];
    Ok(match byte_order {
        ByteOrder::BigEndian => BigEndian::read_u32(id_bytes),
        ByteOrder::LittleEndian => LittleEndian::read_u32(id_bytes),
    })
}

//! Reply messages
//!
//! The reply status decides which fields follow it, so the decoded body is a
//! [`ReplyBody`] whose variant is the status itself.
//!
//! ```text
//! 1.0/1.1  service_contexts, request_id, reply_status, <status fields | result>
//! 1.2      request_id, reply_status, service_contexts, [pad to 8], <status fields | result>
//! ```

use super::PartialBody;
use super::fields::{
    read_disposition, read_ior, read_service_contexts, read_system_exception,
    write_ior, write_service_contexts, write_system_exception,
};
use crate::cdr::{CdrReader, CdrWriter};
use crate::error::{ProtocolError, ProtocolResult};
use crate::policy::VersionPolicy;
use giop_types::{
    AddressingDisposition, CommonHeader, CompletionStatus, EncodingVersion, GiopVersion, Ior,
    ReplyStatus, Revision, ServiceContext, SystemExceptionInfo, GIOP_1_2_BODY_ALIGNMENT,
};

/// Status-dependent part of a reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyBody {
    NoException,
    UserException,
    SystemException(SystemExceptionInfo),
    LocationForward(Ior),
    /// GIOP 1.2 and later
    LocationForwardPerm(Ior),
    /// GIOP 1.2 and later
    NeedsAddressingMode(AddressingDisposition),
}

impl ReplyBody {
    pub fn status(&self) -> ReplyStatus {
        match self {
            ReplyBody::NoException => ReplyStatus::NoException,
            ReplyBody::UserException => ReplyStatus::UserException,
            ReplyBody::SystemException(_) => ReplyStatus::SystemException,
            ReplyBody::LocationForward(_) => ReplyStatus::LocationForward,
            ReplyBody::LocationForwardPerm(_) => ReplyStatus::LocationForwardPerm,
            ReplyBody::NeedsAddressingMode(_) => ReplyStatus::NeedsAddressingMode,
        }
    }

    fn has_fields(&self) -> bool {
        !matches!(self, ReplyBody::NoException | ReplyBody::UserException)
    }

    fn read(status: ReplyStatus, r: &mut CdrReader<'_>) -> ProtocolResult<Self> {
        Ok(match status {
            ReplyStatus::NoException => ReplyBody::NoException,
            ReplyStatus::UserException => ReplyBody::UserException,
            ReplyStatus::SystemException => ReplyBody::SystemException(read_system_exception(r)?),
            ReplyStatus::LocationForward => ReplyBody::LocationForward(read_ior(r)?),
            ReplyStatus::LocationForwardPerm => ReplyBody::LocationForwardPerm(read_ior(r)?),
            ReplyStatus::NeedsAddressingMode => {
                ReplyBody::NeedsAddressingMode(read_disposition(r)?)
            }
        })
    }

    fn write(&self, w: &mut CdrWriter) -> ProtocolResult<()> {
        match self {
            ReplyBody::NoException | ReplyBody::UserException => Ok(()),
            ReplyBody::SystemException(info) => write_system_exception(w, info),
            ReplyBody::LocationForward(ior) | ReplyBody::LocationForwardPerm(ior) => {
                write_ior(w, ior)
            }
            ReplyBody::NeedsAddressingMode(disposition) => {
                w.write_short(*disposition as i16);
                Ok(())
            }
        }
    }
}

/// Decode a reply status and check it exists in `version`
pub(crate) fn read_reply_status(
    r: &mut CdrReader<'_>,
    version: GiopVersion,
) -> ProtocolResult<ReplyStatus> {
    let raw = r.read_ulong()?;
    let invalid = ProtocolError::InvalidReplyStatus {
        kind: "reply",
        status: raw,
        version,
    };
    let status = ReplyStatus::try_from(raw).map_err(|_| invalid.clone())?;
    if !status.is_defined_for(version) {
        return Err(invalid);
    }
    Ok(status)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplyMessage {
    pub(crate) header: CommonHeader,
    pub(crate) revision: Revision,
    pub(crate) encoding: EncodingVersion,
    pub request_id: u32,
    pub service_contexts: Vec<ServiceContext>,
    pub reply: ReplyBody,
    /// Marshaled result or user exception, opaque to this layer
    pub body: Vec<u8>,
    /// Raw body of a first fragment that ended inside the header fields
    pub(crate) partial: Option<PartialBody>,
}

impl ReplyMessage {
    pub(crate) fn shell(header: CommonHeader, revision: Revision, encoding: EncodingVersion) -> Self {
        Self {
            header,
            revision,
            encoding,
            request_id: 0,
            service_contexts: Vec::new(),
            reply: ReplyBody::NoException,
            body: Vec::new(),
            partial: None,
        }
    }

    pub fn header(&self) -> &CommonHeader {
        &self.header
    }

    pub fn revision(&self) -> Revision {
        self.revision
    }

    pub fn reply_status(&self) -> ReplyStatus {
        self.reply.status()
    }

    fn system_exception(&self) -> Option<&SystemExceptionInfo> {
        match &self.reply {
            ReplyBody::SystemException(info) => Some(info),
            _ => None,
        }
    }

    /// Repository id of a system exception reply
    pub fn exception_id(&self) -> Option<&str> {
        self.system_exception().map(|info| info.exception_id.as_str())
    }

    pub fn minor_code(&self) -> Option<u32> {
        self.system_exception().map(|info| info.minor_code)
    }

    pub fn completion_status(&self) -> Option<CompletionStatus> {
        self.system_exception().map(|info| info.completion_status)
    }

    /// Forwarding target of a LocationForward or LocationForwardPerm reply
    pub fn forward_ior(&self) -> Option<&Ior> {
        match &self.reply {
            ReplyBody::LocationForward(ior) | ReplyBody::LocationForwardPerm(ior) => Some(ior),
            _ => None,
        }
    }

    pub(crate) fn read_body(&mut self, body: &[u8]) -> ProtocolResult<()> {
        let version = self.header.version;
        let mut r = CdrReader::for_body(body, self.header.byte_order());
        let (request_id, service_contexts, status) = match self.revision {
            Revision::V1_0 | Revision::V1_1 => {
                let service_contexts = read_service_contexts(&mut r)?;
                let request_id = r.read_ulong()?;
                let status = read_reply_status(&mut r, version)?;
                (request_id, service_contexts, status)
            }
            Revision::V1_2 => {
                let request_id = r.read_ulong()?;
                let status = read_reply_status(&mut r, version)?;
                let service_contexts = read_service_contexts(&mut r)?;
                (request_id, service_contexts, status)
            }
        };
        if VersionPolicy::default().aligns_body(version) && !r.is_empty() {
            r.align(GIOP_1_2_BODY_ALIGNMENT)?;
        }
        let reply = ReplyBody::read(status, &mut r)?;

        self.request_id = request_id;
        self.service_contexts = service_contexts;
        self.reply = reply;
        self.body = r.read_rest().to_vec();
        Ok(())
    }

    pub(crate) fn write_body(&self) -> ProtocolResult<Vec<u8>> {
        let version = self.header.version;
        let status = self.reply.status();
        if !status.is_defined_for(version) {
            return Err(ProtocolError::InvalidReplyStatus {
                kind: "reply",
                status: status as u32,
                version,
            });
        }

        let mut w = CdrWriter::for_body(self.header.byte_order());
        match self.revision {
            Revision::V1_0 | Revision::V1_1 => {
                write_service_contexts(&mut w, &self.service_contexts)?;
                w.write_ulong(self.request_id);
                w.write_ulong(status as u32);
            }
            Revision::V1_2 => {
                w.write_ulong(self.request_id);
                w.write_ulong(status as u32);
                write_service_contexts(&mut w, &self.service_contexts)?;
            }
        }
        if VersionPolicy::default().aligns_body(version)
            && (self.reply.has_fields() || !self.body.is_empty())
        {
            w.align(GIOP_1_2_BODY_ALIGNMENT);
        }
        self.reply.write(&mut w)?;
        w.write_octets(&self.body);
        Ok(w.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use giop_types::{ByteOrder, MessageType, TaggedProfile};

    fn shell(revision: Revision) -> ReplyMessage {
        let header = CommonHeader::new(revision.version(), MessageType::Reply, ByteOrder::BigEndian);
        ReplyMessage::shell(header, revision, EncodingVersion::Cdr)
    }

    fn round_trip(original: &ReplyMessage) -> ReplyMessage {
        let bytes = original.write_body().unwrap();
        let mut decoded = shell(original.revision);
        decoded.read_body(&bytes).unwrap();
        decoded
    }

    #[test]
    fn test_system_exception_exposes_fields() {
        for revision in Revision::ALL {
            let mut reply = shell(revision);
            reply.request_id = 9;
            reply.reply = ReplyBody::SystemException(SystemExceptionInfo::new(
                "IDL:omg.org/CORBA/OBJECT_NOT_EXIST:1.0",
                0x4F4D_0001,
                CompletionStatus::No,
            ));

            let decoded = round_trip(&reply);
            assert_eq!(decoded.reply_status(), ReplyStatus::SystemException);
            assert_eq!(
                decoded.exception_id(),
                Some("IDL:omg.org/CORBA/OBJECT_NOT_EXIST:1.0")
            );
            assert_eq!(decoded.minor_code(), Some(0x4F4D_0001));
            assert_eq!(decoded.completion_status(), Some(CompletionStatus::No));
        }
    }

    #[test]
    fn test_no_exception_has_no_exception_fields() {
        let mut reply = shell(Revision::V1_2);
        reply.body = vec![1, 2, 3, 4];

        let decoded = round_trip(&reply);
        assert_eq!(decoded.reply_status(), ReplyStatus::NoException);
        assert_eq!(decoded.exception_id(), None);
        assert_eq!(decoded.minor_code(), None);
        assert_eq!(decoded.completion_status(), None);
        assert_eq!(decoded.body, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_location_forward_perm_round_trip() {
        let mut reply = shell(Revision::V1_2);
        reply.reply = ReplyBody::LocationForwardPerm(Ior {
            type_id: "IDL:Echo:1.0".to_string(),
            profiles: vec![TaggedProfile {
                tag: 0,
                profile_data: vec![0, 1, 2, 0],
            }],
        });
        let decoded = round_trip(&reply);
        assert_eq!(decoded.forward_ior(), reply.forward_ior());
    }

    #[test]
    fn test_1_2_status_rejected_in_1_1() {
        let mut reply = shell(Revision::V1_1);
        reply.reply = ReplyBody::NeedsAddressingMode(AddressingDisposition::ProfileAddr);
        assert!(matches!(
            reply.write_body(),
            Err(ProtocolError::InvalidReplyStatus { status: 5, .. })
        ));

        // context count 0, request id 1, status 4 (LocationForwardPerm)
        let bytes = [0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 4];
        let mut decoded = shell(Revision::V1_1);
        assert!(matches!(
            decoded.read_body(&bytes),
            Err(ProtocolError::InvalidReplyStatus { status: 4, .. })
        ));
    }

    #[test]
    fn test_unknown_status_rejected() {
        let bytes = [0, 0, 0, 1, 0, 0, 0, 17, 0, 0, 0, 0];
        let mut decoded = shell(Revision::V1_2);
        assert!(matches!(
            decoded.read_body(&bytes),
            Err(ProtocolError::InvalidReplyStatus { status: 17, .. })
        ));
    }
}

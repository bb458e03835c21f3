//! LocateRequest and LocateReply messages
//!
//! ```text
//! LocateRequest 1.0/1.1  request_id, object_key
//! LocateRequest 1.2      request_id, target
//! LocateReply   1.0/1.1  request_id, locate_status, [IOR]
//! LocateReply   1.2      request_id, locate_status, [pad to 8], <status fields>
//! ```

use super::PartialBody;
use super::fields::{
    read_disposition, read_ior, read_system_exception, read_target_address, write_ior,
    write_system_exception, write_target_address,
};
use crate::cdr::{CdrReader, CdrWriter};
use crate::error::{ProtocolError, ProtocolResult};
use crate::policy::VersionPolicy;
use giop_types::{
    AddressingDisposition, CommonHeader, EncodingVersion, Ior, LocateStatus, ObjectKey, Revision,
    SystemExceptionInfo, TargetAddress, GIOP_1_2_BODY_ALIGNMENT,
};

#[derive(Debug, Clone, PartialEq)]
pub struct LocateRequestMessage {
    pub(crate) header: CommonHeader,
    pub(crate) revision: Revision,
    pub(crate) encoding: EncodingVersion,
    pub request_id: u32,
    /// Always `TargetAddress::Key` for 1.0 and 1.1
    pub target: TargetAddress,
    /// Raw body of a first fragment that ended inside the header fields
    pub(crate) partial: Option<PartialBody>,
}

impl LocateRequestMessage {
    pub(crate) fn shell(header: CommonHeader, revision: Revision, encoding: EncodingVersion) -> Self {
        Self {
            header,
            revision,
            encoding,
            request_id: 0,
            target: TargetAddress::Key(ObjectKey::default()),
            partial: None,
        }
    }

    pub fn header(&self) -> &CommonHeader {
        &self.header
    }

    pub fn revision(&self) -> Revision {
        self.revision
    }

    pub fn object_key(&self) -> Option<&ObjectKey> {
        match &self.target {
            TargetAddress::Key(key) => Some(key),
            TargetAddress::Profile(_) | TargetAddress::Reference(_) => None,
        }
    }

    pub(crate) fn read_body(&mut self, body: &[u8]) -> ProtocolResult<()> {
        let mut r = CdrReader::for_body(body, self.header.byte_order());
        let request_id = r.read_ulong()?;
        let target = match self.revision {
            Revision::V1_0 | Revision::V1_1 => TargetAddress::Key(ObjectKey(r.read_octet_seq()?)),
            Revision::V1_2 => read_target_address(&mut r)?,
        };
        self.request_id = request_id;
        self.target = target;
        Ok(())
    }

    pub(crate) fn write_body(&self) -> ProtocolResult<Vec<u8>> {
        let mut w = CdrWriter::for_body(self.header.byte_order());
        w.write_ulong(self.request_id);
        match self.revision {
            Revision::V1_0 | Revision::V1_1 => {
                let key = self.object_key().ok_or(ProtocolError::AddressingDisposition {
                    expected: AddressingDisposition::KeyAddr,
                    actual: self.target.disposition(),
                })?;
                w.write_octet_seq(key.as_bytes())?;
            }
            Revision::V1_2 => write_target_address(&mut w, &self.target)?,
        }
        Ok(w.into_bytes())
    }
}

/// Status-dependent part of a locate reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocateReplyBody {
    UnknownObject,
    ObjectHere,
    ObjectForward(Ior),
    /// GIOP 1.2
    ObjectForwardPerm(Ior),
    /// GIOP 1.2
    LocSystemException(SystemExceptionInfo),
    /// GIOP 1.2
    LocNeedsAddressingMode(AddressingDisposition),
}

impl LocateReplyBody {
    pub fn status(&self) -> LocateStatus {
        match self {
            LocateReplyBody::UnknownObject => LocateStatus::UnknownObject,
            LocateReplyBody::ObjectHere => LocateStatus::ObjectHere,
            LocateReplyBody::ObjectForward(_) => LocateStatus::ObjectForward,
            LocateReplyBody::ObjectForwardPerm(_) => LocateStatus::ObjectForwardPerm,
            LocateReplyBody::LocSystemException(_) => LocateStatus::LocSystemException,
            LocateReplyBody::LocNeedsAddressingMode(_) => LocateStatus::LocNeedsAddressingMode,
        }
    }

    fn has_fields(&self) -> bool {
        !matches!(
            self,
            LocateReplyBody::UnknownObject | LocateReplyBody::ObjectHere
        )
    }

    fn read(status: LocateStatus, r: &mut CdrReader<'_>) -> ProtocolResult<Self> {
        Ok(match status {
            LocateStatus::UnknownObject => LocateReplyBody::UnknownObject,
            LocateStatus::ObjectHere => LocateReplyBody::ObjectHere,
            LocateStatus::ObjectForward => LocateReplyBody::ObjectForward(read_ior(r)?),
            LocateStatus::ObjectForwardPerm => LocateReplyBody::ObjectForwardPerm(read_ior(r)?),
            LocateStatus::LocSystemException => {
                LocateReplyBody::LocSystemException(read_system_exception(r)?)
            }
            LocateStatus::LocNeedsAddressingMode => {
                LocateReplyBody::LocNeedsAddressingMode(read_disposition(r)?)
            }
        })
    }

    fn write(&self, w: &mut CdrWriter) -> ProtocolResult<()> {
        match self {
            LocateReplyBody::UnknownObject | LocateReplyBody::ObjectHere => Ok(()),
            LocateReplyBody::ObjectForward(ior) | LocateReplyBody::ObjectForwardPerm(ior) => {
                write_ior(w, ior)
            }
            LocateReplyBody::LocSystemException(info) => write_system_exception(w, info),
            LocateReplyBody::LocNeedsAddressingMode(disposition) => {
                w.write_short(*disposition as i16);
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocateReplyMessage {
    pub(crate) header: CommonHeader,
    pub(crate) revision: Revision,
    pub(crate) encoding: EncodingVersion,
    pub request_id: u32,
    pub reply: LocateReplyBody,
    /// Raw body of a first fragment that ended inside the header fields
    pub(crate) partial: Option<PartialBody>,
}

impl LocateReplyMessage {
    pub(crate) fn shell(header: CommonHeader, revision: Revision, encoding: EncodingVersion) -> Self {
        Self {
            header,
            revision,
            encoding,
            request_id: 0,
            reply: LocateReplyBody::UnknownObject,
            partial: None,
        }
    }

    pub fn header(&self) -> &CommonHeader {
        &self.header
    }

    pub fn revision(&self) -> Revision {
        self.revision
    }

    pub fn locate_status(&self) -> LocateStatus {
        self.reply.status()
    }

    pub fn forward_ior(&self) -> Option<&Ior> {
        match &self.reply {
            LocateReplyBody::ObjectForward(ior) | LocateReplyBody::ObjectForwardPerm(ior) => {
                Some(ior)
            }
            _ => None,
        }
    }

    pub(crate) fn read_body(&mut self, body: &[u8]) -> ProtocolResult<()> {
        let version = self.header.version;
        let mut r = CdrReader::for_body(body, self.header.byte_order());
        let request_id = r.read_ulong()?;

        let raw = r.read_ulong()?;
        let invalid = ProtocolError::InvalidReplyStatus {
            kind: "locate",
            status: raw,
            version,
        };
        let status = LocateStatus::try_from(raw).map_err(|_| invalid.clone())?;
        if !status.is_defined_for(version) {
            return Err(invalid);
        }

        if VersionPolicy::default().aligns_body(version) && !r.is_empty() {
            r.align(GIOP_1_2_BODY_ALIGNMENT)?;
        }
        let reply = LocateReplyBody::read(status, &mut r)?;

        self.request_id = request_id;
        self.reply = reply;
        Ok(())
    }

    pub(crate) fn write_body(&self) -> ProtocolResult<Vec<u8>> {
        let status = self.reply.status();
        if !status.is_defined_for(self.header.version) {
            return Err(ProtocolError::InvalidReplyStatus {
                kind: "locate",
                status: status as u32,
                version: self.header.version,
            });
        }

        let mut w = CdrWriter::for_body(self.header.byte_order());
        w.write_ulong(self.request_id);
        w.write_ulong(status as u32);
        if VersionPolicy::default().aligns_body(self.header.version) && self.reply.has_fields() {
            w.align(GIOP_1_2_BODY_ALIGNMENT);
        }
        self.reply.write(&mut w)?;
        Ok(w.into_bytes())
    }
}

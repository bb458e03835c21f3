//! Request messages
//!
//! ```text
//! 1.0  service_contexts, request_id, response_expected, object_key, operation, principal
//! 1.1  as 1.0 with 3 reserved octets after response_expected
//! 1.2  request_id, response_flags, reserved[3], target, operation, service_contexts,
//!      [pad to 8], arguments
//! ```

use super::PartialBody;
use super::fields::{
    read_service_contexts, read_target_address, write_service_contexts, write_target_address,
};
use crate::cdr::{CdrReader, CdrWriter};
use crate::error::{ProtocolError, ProtocolResult};
use crate::policy::VersionPolicy;
use giop_types::{
    AddressingDisposition, CommonHeader, EncodingVersion, ObjectKey, Revision, ServiceContext,
    TargetAddress, GIOP_1_2_BODY_ALIGNMENT, RESPONSE_EXPECTED_BIT, RESPONSE_FLAGS_SYNC_WITH_TARGET,
};

#[derive(Debug, Clone, PartialEq)]
pub struct RequestMessage {
    pub(crate) header: CommonHeader,
    pub(crate) revision: Revision,
    pub(crate) encoding: EncodingVersion,
    pub request_id: u32,
    /// 1.0/1.1: the response_expected boolean as 0/1. 1.2: the response flags octet
    pub response_flags: u8,
    /// Reserved octets (1.1 and 1.2)
    pub reserved: [u8; 3],
    /// Always `TargetAddress::Key` for 1.0 and 1.1
    pub target: TargetAddress,
    pub operation: String,
    pub service_contexts: Vec<ServiceContext>,
    /// Requesting principal, 1.0 and 1.1 only
    pub principal: Vec<u8>,
    /// Marshaled arguments, opaque to this layer
    pub body: Vec<u8>,
    /// Raw body of a first fragment that ended inside the header fields
    pub(crate) partial: Option<PartialBody>,
}

impl RequestMessage {
    pub(crate) fn shell(header: CommonHeader, revision: Revision, encoding: EncodingVersion) -> Self {
        Self {
            header,
            revision,
            encoding,
            request_id: 0,
            response_flags: 0,
            reserved: [0; 3],
            target: TargetAddress::Key(ObjectKey::default()),
            operation: String::new(),
            service_contexts: Vec::new(),
            principal: Vec::new(),
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

    pub fn is_response_expected(&self) -> bool {
        self.response_flags & RESPONSE_EXPECTED_BIT != 0
    }

    pub fn set_response_expected(&mut self, expected: bool) {
        self.response_flags = match (self.revision, expected) {
            (Revision::V1_0 | Revision::V1_1, expected) => u8::from(expected),
            (Revision::V1_2, true) => RESPONSE_FLAGS_SYNC_WITH_TARGET,
            (Revision::V1_2, false) => 0,
        };
    }

    /// Object key when the target is addressed by key
    pub fn object_key(&self) -> Option<&ObjectKey> {
        match &self.target {
            TargetAddress::Key(key) => Some(key),
            TargetAddress::Profile(_) | TargetAddress::Reference(_) => None,
        }
    }

    pub(crate) fn read_body(&mut self, body: &[u8]) -> ProtocolResult<()> {
        let mut r = CdrReader::for_body(body, self.header.byte_order());
        let decoded = match self.revision {
            Revision::V1_0 | Revision::V1_1 => {
                let service_contexts = read_service_contexts(&mut r)?;
                let request_id = r.read_ulong()?;
                let response_flags = u8::from(r.read_bool()?);
                let mut reserved = [0u8; 3];
                if self.revision == Revision::V1_1 {
                    reserved.copy_from_slice(r.read_octets(3)?);
                }
                let target = TargetAddress::Key(ObjectKey(r.read_octet_seq()?));
                let operation = r.read_string()?;
                let principal = r.read_octet_seq()?;
                Decoded {
                    request_id,
                    response_flags,
                    reserved,
                    target,
                    operation,
                    service_contexts,
                    principal,
                }
            }
            Revision::V1_2 => {
                let request_id = r.read_ulong()?;
                let response_flags = r.read_octet()?;
                let mut reserved = [0u8; 3];
                reserved.copy_from_slice(r.read_octets(3)?);
                let target = read_target_address(&mut r)?;
                let operation = r.read_string()?;
                let service_contexts = read_service_contexts(&mut r)?;
                Decoded {
                    request_id,
                    response_flags,
                    reserved,
                    target,
                    operation,
                    service_contexts,
                    principal: Vec::new(),
                }
            }
        };
        if VersionPolicy::default().aligns_body(self.header.version) && !r.is_empty() {
            r.align(GIOP_1_2_BODY_ALIGNMENT)?;
        }

        self.request_id = decoded.request_id;
        self.response_flags = decoded.response_flags;
        self.reserved = decoded.reserved;
        self.target = decoded.target;
        self.operation = decoded.operation;
        self.service_contexts = decoded.service_contexts;
        self.principal = decoded.principal;
        self.body = r.read_rest().to_vec();
        Ok(())
    }

    pub(crate) fn write_body(&self) -> ProtocolResult<Vec<u8>> {
        let mut w = CdrWriter::for_body(self.header.byte_order());
        match self.revision {
            Revision::V1_0 | Revision::V1_1 => {
                let key = self.object_key().ok_or(ProtocolError::AddressingDisposition {
                    expected: AddressingDisposition::KeyAddr,
                    actual: self.target.disposition(),
                })?;
                write_service_contexts(&mut w, &self.service_contexts)?;
                w.write_ulong(self.request_id);
                w.write_bool(self.is_response_expected());
                if self.revision == Revision::V1_1 {
                    w.write_octets(&self.reserved);
                }
                w.write_octet_seq(key.as_bytes())?;
                w.write_string(&self.operation)?;
                w.write_octet_seq(&self.principal)?;
            }
            Revision::V1_2 => {
                w.write_ulong(self.request_id);
                w.write_octet(self.response_flags);
                w.write_octets(&self.reserved);
                write_target_address(&mut w, &self.target)?;
                w.write_string(&self.operation)?;
                write_service_contexts(&mut w, &self.service_contexts)?;
            }
        }
        if VersionPolicy::default().aligns_body(self.header.version) && !self.body.is_empty() {
            w.align(GIOP_1_2_BODY_ALIGNMENT);
        }
        w.write_octets(&self.body);
        Ok(w.into_bytes())
    }
}

struct Decoded {
    request_id: u32,
    response_flags: u8,
    reserved: [u8; 3],
    target: TargetAddress,
    operation: String,
    service_contexts: Vec<ServiceContext>,
    principal: Vec<u8>,
}

//! Fragment messages
//!
//! A GIOP 1.2 fragment starts with the request id it continues; a 1.1
//! fragment carries nothing but payload and relies on the connection
//! ordering to be correlated.

use crate::cdr::{CdrReader, CdrWriter};
use crate::error::ProtocolResult;
use giop_types::{CommonHeader, EncodingVersion, Revision};

#[derive(Debug, Clone, PartialEq)]
pub struct FragmentMessage {
    pub(crate) header: CommonHeader,
    pub(crate) revision: Revision,
    pub(crate) encoding: EncodingVersion,
    /// Request id on the wire (1.2 only)
    pub(crate) wire_request_id: Option<u32>,
    /// Id of the originating message for locally built 1.1 fragments; never
    /// written to the wire
    pub correlated_request_id: Option<u32>,
    /// Continuation bytes of the fragmented message
    pub payload: Vec<u8>,
}

impl FragmentMessage {
    pub(crate) fn shell(header: CommonHeader, revision: Revision, encoding: EncodingVersion) -> Self {
        Self {
            header,
            revision,
            encoding,
            wire_request_id: None,
            correlated_request_id: None,
            payload: Vec::new(),
        }
    }

    pub fn header(&self) -> &CommonHeader {
        &self.header
    }

    pub fn revision(&self) -> Revision {
        self.revision
    }

    pub fn more_fragments(&self) -> bool {
        self.header.more_fragments()
    }

    /// Request id carried on the wire, or -1 for GIOP 1.1
    pub fn request_id(&self) -> i32 {
        self.wire_request_id.map_or(-1, |id| id as i32)
    }

    /// Set the request id this fragment continues
    ///
    /// For 1.2 it becomes part of the wire format; for 1.1 it is only kept
    /// locally.
    pub fn set_request_id(&mut self, request_id: u32) {
        match self.revision {
            Revision::V1_2 => self.wire_request_id = Some(request_id),
            Revision::V1_0 | Revision::V1_1 => self.correlated_request_id = Some(request_id),
        }
    }

    pub(crate) fn read_body(&mut self, body: &[u8]) -> ProtocolResult<()> {
        let mut r = CdrReader::for_body(body, self.header.byte_order());
        let wire_request_id = match self.revision {
            Revision::V1_2 => Some(r.read_ulong()?),
            Revision::V1_0 | Revision::V1_1 => None,
        };
        self.wire_request_id = wire_request_id;
        self.payload = r.read_rest().to_vec();
        Ok(())
    }

    pub(crate) fn write_body(&self) -> ProtocolResult<Vec<u8>> {
        let mut w = CdrWriter::for_body(self.header.byte_order());
        if self.revision == Revision::V1_2 {
            w.write_ulong(self.wire_request_id.unwrap_or_default());
        }
        w.write_octets(&self.payload);
        Ok(w.into_bytes())
    }
}

//! CancelRequest, CloseConnection and MessageError

use crate::cdr::{CdrReader, CdrWriter};
use crate::error::{ProtocolError, ProtocolResult};
use giop_types::{CommonHeader, EncodingVersion, Revision};

/// CancelRequest: the request id and nothing else
#[derive(Debug, Clone, PartialEq)]
pub struct CancelRequestMessage {
    pub(crate) header: CommonHeader,
    pub(crate) revision: Revision,
    pub(crate) encoding: EncodingVersion,
    pub request_id: u32,
}

impl CancelRequestMessage {
    pub(crate) fn shell(header: CommonHeader, revision: Revision, encoding: EncodingVersion) -> Self {
        Self {
            header,
            revision,
            encoding,
            request_id: 0,
        }
    }

    pub fn header(&self) -> &CommonHeader {
        &self.header
    }

    pub fn revision(&self) -> Revision {
        self.revision
    }

    pub(crate) fn read_body(&mut self, body: &[u8]) -> ProtocolResult<()> {
        let mut r = CdrReader::for_body(body, self.header.byte_order());
        self.request_id = r.read_ulong()?;
        Ok(())
    }

    pub(crate) fn write_body(&self) -> ProtocolResult<Vec<u8>> {
        let mut w = CdrWriter::for_body(self.header.byte_order());
        w.write_ulong(self.request_id);
        Ok(w.into_bytes())
    }
}

/// Header-only message: CloseConnection or MessageError
///
/// Any 1.x version is kept as received so that a peer announcing a newer
/// minor version can still be told why the connection is going away.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlMessage {
    pub(crate) header: CommonHeader,
}

impl ControlMessage {
    pub(crate) fn shell(header: CommonHeader) -> Self {
        Self { header }
    }

    pub fn header(&self) -> &CommonHeader {
        &self.header
    }

    pub(crate) fn read_body(&mut self, body: &[u8]) -> ProtocolResult<()> {
        if self.header.message_type.is_header_only() && !body.is_empty() {
            return Err(ProtocolError::marshal(
                0,
                format!(
                    "{} carries no body, got {} bytes",
                    self.header.message_type,
                    body.len()
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use giop_types::{ByteOrder, GiopVersion, MessageType};

    #[test]
    fn test_header_only_kinds_reject_body_bytes() {
        for message_type in [MessageType::CloseConnection, MessageType::MessageError] {
            let header = CommonHeader::new(GiopVersion::V1_1, message_type, ByteOrder::BigEndian);
            let mut control = ControlMessage::shell(header);
            assert!(control.read_body(&[]).is_ok());
            assert!(matches!(
                control.read_body(&[0, 0]),
                Err(ProtocolError::Marshal { offset: 0, .. })
            ));
        }
    }

    #[test]
    fn test_cancel_request_round_trip() {
        let header =
            CommonHeader::new(GiopVersion::V1_2, MessageType::CancelRequest, ByteOrder::LittleEndian);
        let mut cancel = CancelRequestMessage::shell(header, Revision::V1_2, EncodingVersion::Cdr);
        cancel.request_id = 31;
        let bytes = cancel.write_body().unwrap();
        assert_eq!(bytes, vec![31, 0, 0, 0]);

        let mut decoded = CancelRequestMessage::shell(header, Revision::V1_2, EncodingVersion::Cdr);
        decoded.read_body(&bytes).unwrap();
        assert_eq!(decoded.request_id, 31);
    }
}

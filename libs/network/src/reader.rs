//! # Frame Reader
//!
//! Per-connection state machine that turns a byte stream into messages:
//!
//! ```text
//! AwaitHeader ──12 bytes──▶ HeaderValidated ──shell──▶ AwaitBody ──body──▶ Complete
//!      │                          │                        │
//!      └───── I/O, timeout, EOF, protocol violation ───────┴──▶ Error (terminal)
//! ```
//!
//! The header and the body are each read under their own timeout. A header
//! announcing more than the configured maximum message size is rejected
//! before any body byte is read or allocated. A header
//! that breaks a protocol rule poisons the reader: later calls return
//! [`FrameError::Poisoned`] and the caller may send a best-effort
//! MessageError with [`FrameReader::send_message_error`]. A body that fails
//! to decode is reported as [`FrameError::Body`] and the reader goes back
//! to waiting for the next header.

use crate::error::{FrameError, Result, Stage};
use crate::transport::Transport;
use giop_codec::{unmarshal_request_id, Message, MessageFactory, ProtocolError};
use giop_config::{OrbConfig, TimeoutSettings};
use giop_types::{CommonHeader, GiopVersion};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    AwaitHeader,
    HeaderValidated,
    AwaitBody,
    Complete,
    Error,
}

/// Parse and validate a header, then build the empty message for it
pub(crate) fn open_frame(
    factory: &MessageFactory,
    bytes: &[u8],
) -> std::result::Result<(CommonHeader, Message), ProtocolError> {
    let (header, encoding) = factory.header_codec().parse(bytes)?;
    factory.policy().validate_header(&header)?;
    let shell = factory.create_from_header(header, encoding)?;
    Ok((header, shell))
}

/// Decode the body into the shell
///
/// On failure the request id is recovered from the raw body when the
/// version puts it first.
pub(crate) fn finish_frame(
    factory: &MessageFactory,
    header: &CommonHeader,
    mut shell: Message,
    body: &[u8],
) -> Result<Message> {
    match shell.read_body(body) {
        Ok(()) => Ok(shell),
        Err(source) => {
            let request_id = factory
                .policy()
                .request_id_leads_body(header.version, header.message_type)
                .then(|| unmarshal_request_id(body, header.byte_order()).ok())
                .flatten();
            Err(FrameError::Body {
                message_type: header.message_type,
                request_id,
                source,
            })
        }
    }
}

/// Version to answer a failed peer with: its own when usable, else ours
pub(crate) fn reply_version(factory: &MessageFactory, peer: Option<GiopVersion>) -> GiopVersion {
    let max = factory.policy().max_version();
    match peer {
        Some(version) if version.revision().is_some() && version <= max => version,
        _ => max,
    }
}

pub struct FrameReader<T> {
    transport: T,
    factory: MessageFactory,
    header_timeout: Duration,
    body_timeout: Duration,
    write_timeout: Duration,
    state: ReaderState,
    last_version: Option<GiopVersion>,
}

impl<T: Transport> FrameReader<T> {
    pub fn new(transport: T, config: &OrbConfig) -> Self {
        Self::with_factory(
            transport,
            MessageFactory::from_config(config),
            &config.timeouts,
        )
    }

    pub fn with_factory(transport: T, factory: MessageFactory, timeouts: &TimeoutSettings) -> Self {
        Self {
            transport,
            factory,
            header_timeout: timeouts.header_read(),
            body_timeout: timeouts.body_read(),
            write_timeout: timeouts.write(),
            state: ReaderState::AwaitHeader,
            last_version: None,
        }
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    pub fn is_poisoned(&self) -> bool {
        self.state == ReaderState::Error
    }

    pub fn factory(&self) -> &MessageFactory {
        &self.factory
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Read the next complete message
    pub fn read_message(&mut self) -> Result<Message> {
        if self.state == ReaderState::Error {
            return Err(FrameError::Poisoned);
        }
        self.state = ReaderState::AwaitHeader;

        let header_bytes = self
            .read_exact(CommonHeader::SIZE, Stage::Header, self.header_timeout)
            .map_err(|e| self.poison(e))?;
        let (header, shell) =
            open_frame(&self.factory, &header_bytes).map_err(|e| self.poison(e.into()))?;
        self.state = ReaderState::HeaderValidated;
        self.last_version = Some(header.version);

        self.state = ReaderState::AwaitBody;
        let body = match header.body_size() {
            0 => Vec::new(),
            size => self
                .read_exact(size, Stage::Body, self.body_timeout)
                .map_err(|e| self.poison(e))?,
        };

        match finish_frame(&self.factory, &header, shell, &body) {
            Ok(message) => {
                self.state = ReaderState::Complete;
                debug!(
                    version = %header.version,
                    message_type = header.message_type.name(),
                    request_id = message.request_id(),
                    size = header.message_size,
                    incomplete = message.is_incomplete(),
                    "frame complete"
                );
                Ok(message)
            }
            Err(err) => {
                warn!(error = %err, "discarding frame with undecodable body");
                self.state = ReaderState::AwaitHeader;
                Err(err)
            }
        }
    }

    /// Tell the peer its last frame was rejected
    ///
    /// Best effort: a failure here is reported but changes nothing, the
    /// connection is already being abandoned.
    pub fn send_message_error(&mut self) -> Result<()> {
        let version = reply_version(&self.factory, self.last_version);
        let mut message = self.factory.create_message_error(version)?;
        let frame = message.to_bytes()?;
        self.transport
            .write_all(&frame, self.write_timeout)
            .map_err(|e| FrameError::from_io(Stage::Write, self.write_timeout, e))?;
        debug!(version = %version, "sent MessageError");
        Ok(())
    }

    fn read_exact(&mut self, len: usize, stage: Stage, timeout: Duration) -> Result<Vec<u8>> {
        self.transport
            .read(len, len, timeout)
            .map_err(|e| FrameError::from_io(stage, timeout, e))
    }

    fn poison(&mut self, err: FrameError) -> FrameError {
        warn!(error = %err, state = ?self.state, "frame reader poisoned");
        self.state = ReaderState::Error;
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryTransport;
    use giop_types::{InvocationTarget, ObjectKey};

    fn request_frame(request_id: u32) -> Vec<u8> {
        let target = InvocationTarget::from_key(ObjectKey::new(vec![7]));
        MessageFactory::default()
            .create_request(GiopVersion::V1_2, request_id, &target, "op", true, Vec::new())
            .unwrap()
            .to_bytes()
            .unwrap()
    }

    #[test]
    fn test_states_through_a_frame() {
        let transport = MemoryTransport::closed(request_frame(1));
        let mut reader = FrameReader::new(transport, &OrbConfig::default());
        assert_eq!(reader.state(), ReaderState::AwaitHeader);

        let message = reader.read_message().unwrap();
        assert_eq!(message.request_id(), 1);
        assert_eq!(reader.state(), ReaderState::Complete);
        assert_eq!(reader.transport().remaining(), 0);
    }

    #[test]
    fn test_reply_version_clamps_to_local_max() {
        let factory = MessageFactory::default();
        assert_eq!(reply_version(&factory, None), GiopVersion::V1_2);
        assert_eq!(
            reply_version(&factory, Some(GiopVersion::V1_0)),
            GiopVersion::V1_0
        );
        assert_eq!(
            reply_version(&factory, Some(GiopVersion::new(1, 7))),
            GiopVersion::V1_2
        );
    }
}

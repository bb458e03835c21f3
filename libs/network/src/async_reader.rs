//! Async frame reader over tokio streams
//!
//! Same states and error semantics as [`crate::FrameReader`]; each phase
//! is a `read_exact` under `tokio::time::timeout`. The reader takes
//! `&mut self`, so a connection still has exactly one reader.

use crate::error::{FrameError, Result, Stage};
use crate::reader::{finish_frame, open_frame, reply_version, ReaderState};
use bytes::{Bytes, BytesMut};
use giop_codec::{Message, MessageFactory};
use giop_config::{OrbConfig, TimeoutSettings};
use giop_types::{CommonHeader, GiopVersion};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tracing::{debug, warn};

pub struct AsyncFrameReader<S> {
    stream: S,
    factory: MessageFactory,
    header_timeout: Duration,
    body_timeout: Duration,
    write_timeout: Duration,
    state: ReaderState,
    last_version: Option<GiopVersion>,
}

impl<S> AsyncFrameReader<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, config: &OrbConfig) -> Self {
        Self::with_factory(stream, MessageFactory::from_config(config), &config.timeouts)
    }

    pub fn with_factory(stream: S, factory: MessageFactory, timeouts: &TimeoutSettings) -> Self {
        Self {
            stream,
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

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    pub async fn read_message(&mut self) -> Result<Message> {
        if self.state == ReaderState::Error {
            return Err(FrameError::Poisoned);
        }
        self.state = ReaderState::AwaitHeader;

        let header_bytes = match self
            .read_exact(CommonHeader::SIZE, Stage::Header, self.header_timeout)
            .await
        {
            Ok(bytes) => bytes,
            Err(err) => return Err(self.poison(err)),
        };
        let (header, shell) = match open_frame(&self.factory, &header_bytes) {
            Ok(opened) => opened,
            Err(err) => return Err(self.poison(err.into())),
        };
        self.state = ReaderState::HeaderValidated;
        self.last_version = Some(header.version);

        self.state = ReaderState::AwaitBody;
        let body = match header.body_size() {
            0 => Bytes::new(),
            size => match self.read_exact(size, Stage::Body, self.body_timeout).await {
                Ok(bytes) => bytes,
                Err(err) => return Err(self.poison(err)),
            },
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

    /// Best-effort MessageError to the peer
    pub async fn send_message_error(&mut self) -> Result<()> {
        let version = reply_version(&self.factory, self.last_version);
        let frame = self.factory.create_message_error(version)?.to_bytes()?;
        let limit = self.write_timeout;
        let stream = &mut self.stream;
        let write = async {
            stream.write_all(&frame).await?;
            stream.flush().await
        };
        match timeout(limit, write).await {
            Ok(result) => result.map_err(|e| FrameError::from_io(Stage::Write, limit, e))?,
            Err(_) => return Err(FrameError::timeout(Stage::Write, limit)),
        }
        debug!(version = %version, "sent MessageError");
        Ok(())
    }

    async fn read_exact(&mut self, len: usize, stage: Stage, limit: Duration) -> Result<Bytes> {
        let mut buf = BytesMut::zeroed(len);
        match timeout(limit, self.stream.read_exact(&mut buf)).await {
            Ok(Ok(_)) => Ok(buf.freeze()),
            Ok(Err(e)) => Err(FrameError::from_io(stage, limit, e)),
            Err(_) => Err(FrameError::timeout(stage, limit)),
        }
    }

    fn poison(&mut self, err: FrameError) -> FrameError {
        warn!(error = %err, state = ?self.state, "frame reader poisoned");
        self.state = ReaderState::Error;
        err
    }
}

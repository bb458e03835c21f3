//! Frame writer
//!
//! Serializes outbound messages, splitting those larger than the
//! configured fragment size, and hands each frame to the transport under
//! the write timeout. When a fragmented Request fails after its first
//! frames went out, the writer sends a best-effort CancelRequest so the
//! peer stops waiting for the remaining fragments.

use crate::error::{FrameError, Result, Stage};
use crate::transport::Transport;
use giop_codec::{Fragmenter, Message, MessageFactory};
use giop_config::{OrbConfig, TimeoutSettings};
use giop_types::MessageType;
use std::time::Duration;
use tracing::{debug, warn};

pub struct FrameWriter<T> {
    transport: T,
    factory: MessageFactory,
    fragmenter: Fragmenter,
    write_timeout: Duration,
}

impl<T: Transport> FrameWriter<T> {
    pub fn new(transport: T, config: &OrbConfig) -> Self {
        Self::with_parts(
            transport,
            MessageFactory::from_config(config),
            Fragmenter::from_config(&config.giop),
            &config.timeouts,
        )
    }

    pub fn with_parts(
        transport: T,
        factory: MessageFactory,
        fragmenter: Fragmenter,
        timeouts: &TimeoutSettings,
    ) -> Self {
        Self {
            transport,
            factory,
            fragmenter,
            write_timeout: timeouts.write(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Write `message`, fragmented if needed; returns the number of frames
    pub fn write_message(&mut self, message: &mut Message) -> Result<usize> {
        let frames = self.fragmenter.split(message)?;
        for (sent, frame) in frames.iter().enumerate() {
            if let Err(e) = self.transport.write_all(frame, self.write_timeout) {
                let err = FrameError::from_io(Stage::Write, self.write_timeout, e);
                if sent > 0 {
                    self.cancel_unfinished(message, sent, frames.len());
                }
                return Err(err);
            }
        }
        debug!(
            message_type = message.message_type().name(),
            request_id = message.request_id(),
            frames = frames.len(),
            "message written"
        );
        Ok(frames.len())
    }

    /// Best-effort CancelRequest for a Request whose final fragment was
    /// never sent
    fn cancel_unfinished(&mut self, message: &Message, sent: usize, total: usize) {
        if message.message_type() != MessageType::Request {
            return;
        }
        let request_id = message.request_id() as u32;
        warn!(
            request_id,
            sent, total, "write failed before the final fragment, cancelling request"
        );

        let frame = self
            .factory
            .create_cancel_request(message.version(), request_id)
            .and_then(|mut cancel| cancel.to_bytes());
        let delivered = match frame {
            Ok(frame) => self
                .transport
                .write_all(&frame, self.write_timeout)
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        if let Err(reason) = delivered {
            debug!(request_id, reason = %reason, "CancelRequest not sent");
        }
    }
}

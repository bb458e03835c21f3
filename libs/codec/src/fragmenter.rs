//! Splitting outbound messages into fragment frames
//!
//! A serialized message larger than the configured fragment size goes out
//! as its original header (with the more-fragments bit set) carrying the
//! first part of the body, followed by Fragment messages carrying the
//! rest. Every frame except the last is exactly `fragment_size` bytes.
//! The size is a multiple of 8, so GIOP 1.2 payloads stay 8-aligned
//! across frames.

use crate::error::{ProtocolError, ProtocolResult};
use crate::messages::Message;
use crate::policy::VersionPolicy;
use crate::size::patch_size;
use giop_config::defaults::giop::{FRAGMENT_SIZE_MULTIPLE, MIN_FRAGMENT_SIZE};
use giop_config::GiopSettings;
use giop_types::{CommonHeader, FLAGS_OFFSET, FLAG_MORE_FRAGMENTS};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fragmenter {
    fragment_size: usize,
}

impl Default for Fragmenter {
    fn default() -> Self {
        Self::from_config(&GiopSettings::default())
    }
}

impl Fragmenter {
    /// Sizes are raised to the minimum and rounded down to a multiple of 8
    pub fn new(fragment_size: u32) -> Self {
        let size = fragment_size.max(MIN_FRAGMENT_SIZE);
        let size = size - size % FRAGMENT_SIZE_MULTIPLE;
        Self {
            fragment_size: size as usize,
        }
    }

    pub fn from_config(settings: &GiopSettings) -> Self {
        Self::new(settings.fragment_size)
    }

    pub fn fragment_size(&self) -> usize {
        self.fragment_size
    }

    /// Serialize `message` into one or more frames
    ///
    /// The message's header records the size of the unfragmented
    /// serialization.
    pub fn split(&self, message: &mut Message) -> ProtocolResult<Vec<Vec<u8>>> {
        let bytes = message.to_bytes()?;
        if bytes.len() <= self.fragment_size {
            return Ok(vec![bytes]);
        }

        let version = message.version();
        let message_type = message.message_type();
        let policy = VersionPolicy::default();
        if !policy.allows_fragmentation(version, message_type) {
            return Err(ProtocolError::fragmentation_disallowed(
                version,
                message_type,
                format!(
                    "{} byte message exceeds fragment size {}",
                    bytes.len(),
                    self.fragment_size
                ),
            ));
        }

        let (head, body) = bytes.split_at(CommonHeader::SIZE);
        let first_len = self.fragment_size - CommonHeader::SIZE;
        let (first_body, mut rest) = body.split_at(first_len);

        let mut first = Vec::with_capacity(self.fragment_size);
        first.extend_from_slice(head);
        first[FLAGS_OFFSET] |= FLAG_MORE_FRAGMENTS;
        first.extend_from_slice(first_body);
        patch_size(&mut first, self.fragment_size)?;
        trace!(header = %hex::encode(&first[..CommonHeader::SIZE]), "first frame");

        let mut frames = vec![first];
        let template = message.create_fragment_message()?;
        let chunk_len = self.fragment_size - policy.fragment_header_size(version);
        while !rest.is_empty() {
            let take = chunk_len.min(rest.len());
            let (chunk, tail) = rest.split_at(take);
            rest = tail;

            let mut fragment = template.clone().with_body(chunk.to_vec())?;
            fragment.set_more_fragments(!rest.is_empty());
            frames.push(fragment.to_bytes()?);
        }

        debug!(
            version = %version,
            message_type = message_type.name(),
            request_id = message.request_id(),
            total = bytes.len(),
            frames = frames.len(),
            "split message into fragments"
        );
        Ok(frames)
    }
}

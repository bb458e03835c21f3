//! # GIOP Codec - Message Framing and Dispatch
//!
//! ## Purpose
//!
//! The "rules" layer of the GIOP stack:
//! - Common header parsing and serialization, including the java
//!   serialization marker
//! - Version admission and fragmentation legality per GIOP revision
//! - The closed set of message variants with their per-version body codecs
//! - Outbound construction with two-phase size patching
//! - Fragment splitting, target address resolution and request partitioning
//!
//! ## Architecture Role
//!
//! ```text
//! giop-types → [giop-codec] → giop-network
//!     ↑             ↓               ↓
//! Pure Data    Header/Body      Frame reader
//! Structures   Rules/Codecs     Transports
//! ```
//!
//! ## What This Crate Contains
//! - [`HeaderCodec`]: the 12-byte common header
//! - [`VersionPolicy`]: admission, fragmentation table, request id position
//! - [`Message`]: one variant per message kind, plus [`MessageHandler`]
//! - [`MessageFactory`]: inbound shells and outbound constructors
//! - [`Fragmenter`]: splits oversized outbound messages
//! - [`TargetResolver`]: GIOP 1.2 addressing dispositions to object keys
//!
//! ## What This Crate Does NOT Contain
//! - Socket reads, timeouts or connection state (belongs in giop-network)
//! - Argument/result marshaling beyond the message header fields
//! - Fragment reassembly
//!
//! ## Example
//!
//! ```rust
//! use giop_codec::MessageFactory;
//! use giop_types::{GiopVersion, InvocationTarget, ObjectKey};
//!
//! let factory = MessageFactory::default();
//! let target = InvocationTarget::from_key(ObjectKey::new(vec![1, 2]));
//! let mut request = factory
//!     .create_request(GiopVersion::V1_2, 42, &target, "foo", true, Vec::new())
//!     .unwrap();
//! let frame = request.to_bytes().unwrap();
//!
//! let decoded = factory.parse_frame(&frame).unwrap();
//! assert_eq!(decoded.request_id(), 42);
//! ```

pub mod addressing;
pub mod cdr;
pub mod dispatch;
pub mod error;
pub mod factory;
pub mod fragmenter;
pub mod header;
pub mod messages;
pub mod partitioning;
pub mod policy;
pub mod size;

pub use addressing::{IiopProfile, ObjectKeyResolver, RawObjectKeys, TargetResolver};
pub use dispatch::MessageHandler;
pub use error::{ProtocolError, ProtocolResult};
pub use factory::MessageFactory;
pub use fragmenter::Fragmenter;
pub use header::HeaderCodec;
pub use messages::{
    CancelRequestMessage, ControlMessage, FragmentMessage, LocateReplyBody, LocateReplyMessage,
    LocateRequestMessage, Message, ReplyBody, ReplyMessage, RequestMessage,
};
pub use partitioning::{partitioning_component, read_partitioning_component, select_partitioning_id};
pub use policy::{unmarshal_request_id, VersionPolicy};
pub use size::patch_size;

pub use giop_config::AddressingPolicy;

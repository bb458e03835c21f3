//! Protocol layer definitions for GIOP
//!
//! This module contains the pure data side of the protocol: constants,
//! versions, message kinds, the common header and the addressing types
//! that message bodies refer to.

pub mod addressing;
pub mod constants;
pub mod message;
pub mod message_type;
pub mod service_context;
pub mod status;
pub mod version;

pub use addressing::{
    AddressingDisposition, InvocationTarget, Ior, IorAddressingInfo, ObjectKey, TaggedComponent,
    TaggedProfile, TargetAddress,
};
pub use constants::*;
pub use message::{ByteOrder, CommonHeader};
pub use message_type::MessageType;
pub use service_context::ServiceContext;
pub use status::{CompletionStatus, LocateStatus, ReplyStatus, SystemExceptionInfo};
pub use version::{EncodingVersion, GiopVersion, Revision, VersionParseError};

//! # GIOP Types Library
//!
//! Pure data definitions for the GIOP message framing layer.
//!
//! ## Design Philosophy
//!
//! - **No behaviour beyond accessors**: parsing, validation and serialization
//!   live in `giop-codec`; this crate only names things
//! - **Closed enums**: message types, revisions and statuses are exhaustive
//!   enums so that every consumer matches them completely
//! - **Wire values explicit**: every enum that travels on the wire has a
//!   `#[repr]` and converts from its primitive with `TryFrom`
//!
//! ## Quick Start
//!
//! ```rust
//! use giop_types::{ByteOrder, CommonHeader, GiopVersion, MessageType};
//!
//! let mut header = CommonHeader::new(GiopVersion::V1_2, MessageType::Request, ByteOrder::BigEndian);
//! header.set_thread_pool_id(3);
//! assert_eq!(header.thread_pool_id(), 3);
//! assert_eq!(header.message_size, 0);
//! ```
//!
//! ## Integration Points
//!
//! ```text
//! giop-types → giop-config → giop-codec → giop-network
//!     ↑             ↑             ↓              ↓
//! Pure Data    Settings     Wire Rules      Transport
//! ```

pub mod protocol;

pub use protocol::*;

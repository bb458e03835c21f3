//! # Common Header Definitions
//!
//! ## Purpose
//!
//! Defines the 12-byte GIOP common header shared by every message kind and
//! every protocol revision. Parsing and writing live in the codec crate; this
//! module only holds the decoded field values and the flag-bit accessors.
//!
//! ## Architecture Role
//!
//! ```text
//! Transport bytes → [codec::HeaderCodec] → CommonHeader → Message variant
//!                                              ↓
//!                              version · flags · type · size
//! ```
//!
//! ## Size Convention
//!
//! The wire size field counts body bytes only. `CommonHeader::message_size`
//! counts the whole message, header included, so a header-only message has a
//! `message_size` of 12 and a wire size field of 0.

pub mod header;

pub use header::*;

//! GIOP Network Layer
//!
//! Moves GIOP frames between a connection and the codec:
//!
//! - [`Transport`]: blocking byte source/sink with per-read deadlines
//!   ([`TcpTransport`], [`MemoryTransport`])
//! - [`FrameReader`]: header/body state machine with separate timeouts
//! - [`AsyncFrameReader`]: the same over tokio `AsyncRead`
//! - [`FrameWriter`]: serializes and fragments outbound messages
//!
//! One reader per connection; nothing here is shared between threads.
//! Fragment reassembly belongs to the layer above.

pub mod async_reader;
pub mod error;
pub mod reader;
pub mod transport;
pub mod writer;

pub use async_reader::AsyncFrameReader;
pub use error::{FrameError, Result, Stage};
pub use reader::{FrameReader, ReaderState};
pub use transport::{MemoryTransport, TcpTransport, Transport};
pub use writer::FrameWriter;

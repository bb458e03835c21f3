//! Frame Error Types
//!
//! Errors surfaced by the frame reader and writer. Protocol violations in
//! the header poison the connection; a body that fails to decode only
//! affects its own request.

use giop_codec::ProtocolError;
use giop_types::MessageType;
use std::fmt;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Where in the frame lifecycle an I/O problem happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Header,
    Body,
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Header => "header read",
            Stage::Body => "body read",
            Stage::Write => "write",
        })
    }
}

#[derive(Error, Debug)]
pub enum FrameError {
    /// Header-level protocol violation; the connection is unusable
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Body failed to decode; the next frame can still be read
    #[error("{message_type:?} body failed to decode (request id {request_id:?}): {source}")]
    Body {
        message_type: MessageType,
        request_id: Option<u32>,
        #[source]
        source: ProtocolError,
    },

    #[error("I/O error during {stage}: {source}")]
    IoFailure {
        stage: Stage,
        #[source]
        source: io::Error,
    },

    #[error("Timeout during {stage}: exceeded {timeout_ms}ms")]
    Timeout { stage: Stage, timeout_ms: u64 },

    #[error("Connection closed during {stage}")]
    ConnectionClosed { stage: Stage },

    #[error("Reader refused: an earlier fatal error poisoned the connection")]
    Poisoned,
}

/// Result type alias for frame operations
pub type Result<T> = std::result::Result<T, FrameError>;

impl FrameError {
    /// Classify a transport error
    pub fn from_io(stage: Stage, timeout: Duration, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::UnexpectedEof => Self::ConnectionClosed { stage },
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Self::timeout(stage, timeout),
            _ => Self::IoFailure { stage, source },
        }
    }

    pub fn timeout(stage: Stage, timeout: Duration) -> Self {
        Self::Timeout {
            stage,
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    /// Whether the reader must stop using the connection
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Body { .. })
    }

    /// Whether the peer should be told with a MessageError
    pub fn warrants_message_error(&self) -> bool {
        match self {
            Self::Protocol(err) => err.is_connection_fatal(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_classification() {
        let limit = Duration::from_millis(250);
        let eof = io::Error::new(io::ErrorKind::UnexpectedEof, "eof");
        assert!(matches!(
            FrameError::from_io(Stage::Header, limit, eof),
            FrameError::ConnectionClosed {
                stage: Stage::Header
            }
        ));

        let slow = io::Error::new(io::ErrorKind::WouldBlock, "slow");
        assert!(matches!(
            FrameError::from_io(Stage::Body, limit, slow),
            FrameError::Timeout {
                stage: Stage::Body,
                timeout_ms: 250
            }
        ));

        let reset = io::Error::new(io::ErrorKind::ConnectionReset, "reset");
        assert!(matches!(
            FrameError::from_io(Stage::Write, limit, reset),
            FrameError::IoFailure {
                stage: Stage::Write,
                ..
            }
        ));
    }

    #[test]
    fn test_only_body_errors_are_recoverable() {
        let body = FrameError::Body {
            message_type: MessageType::Request,
            request_id: Some(1),
            source: ProtocolError::marshal(4, "short string"),
        };
        assert!(!body.is_fatal());
        assert!(FrameError::Poisoned.is_fatal());
        assert!(FrameError::ConnectionClosed {
            stage: Stage::Body
        }
        .is_fatal());
    }

    #[test]
    fn test_message_error_only_for_protocol_violations() {
        let magic = FrameError::Protocol(ProtocolError::magic_mismatch(0x4749_4F50, 0));
        assert!(magic.warrants_message_error());
        assert!(!FrameError::timeout(Stage::Header, Duration::from_secs(1)).warrants_message_error());
    }

    #[test]
    fn test_display_names_stage() {
        let err = FrameError::timeout(Stage::Header, Duration::from_millis(5000));
        assert_eq!(err.to_string(), "Timeout during header read: exceeded 5000ms");
    }
}

//! Blocking Transport Layer
//!
//! The frame reader pulls bytes through [`Transport::read`], asking for an
//! exact count with a deadline, and pushes finished frames through
//! [`Transport::write_all`], also under a deadline. Errors are plain
//! [`std::io::Error`]s; the reader maps `UnexpectedEof` to a closed
//! connection and `TimedOut`/`WouldBlock` to a timeout.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

/// Byte source and sink for one connection
pub trait Transport {
    /// Read at least `min` and at most `max` bytes within `timeout`
    fn read(&mut self, min: usize, max: usize, timeout: Duration) -> io::Result<Vec<u8>>;

    /// Write every byte of `bytes` within `timeout`
    fn write_all(&mut self, bytes: &[u8], timeout: Duration) -> io::Result<()>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn read(&mut self, min: usize, max: usize, timeout: Duration) -> io::Result<Vec<u8>> {
        (**self).read(min, max, timeout)
    }

    fn write_all(&mut self, bytes: &[u8], timeout: Duration) -> io::Result<()> {
        (**self).write_all(bytes, timeout)
    }
}

/// TCP transport over a blocking std socket
#[derive(Debug)]
pub struct TcpTransport {
    stream: TcpStream,
}

impl TcpTransport {
    pub fn connect(addr: impl ToSocketAddrs) -> io::Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        Ok(Self { stream })
    }

    pub fn from_stream(stream: TcpStream) -> Self {
        Self { stream }
    }

    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.stream.peer_addr()
    }

    pub fn into_inner(self) -> TcpStream {
        self.stream
    }
}

impl Transport for TcpTransport {
    fn read(&mut self, min: usize, max: usize, timeout: Duration) -> io::Result<Vec<u8>> {
        let deadline = Instant::now() + timeout;
        let mut buf = vec![0u8; max.max(min)];
        let mut filled = 0;

        while filled < min {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("read {filled} of {min} bytes before the deadline"),
                ));
            }
            self.stream.set_read_timeout(Some(remaining))?;

            match self.stream.read(&mut buf[filled..]) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!("peer closed after {filled} of {min} bytes"),
                    ))
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        buf.truncate(filled);
        Ok(buf)
    }

    fn write_all(&mut self, bytes: &[u8], timeout: Duration) -> io::Result<()> {
        self.stream.set_write_timeout(Some(timeout))?;
        self.stream.write_all(bytes)?;
        self.stream.flush()
    }
}

/// In-memory transport for captures and tests
///
/// A closed transport reports EOF once its bytes run out; an open one
/// reports a timeout instead, as a silent peer would.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    inbound: VecDeque<u8>,
    outbound: Vec<u8>,
    closed: bool,
}

impl MemoryTransport {
    /// Transport whose peer sent `bytes` and then closed
    pub fn closed(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes: Vec<u8> = bytes.into();
        Self {
            inbound: VecDeque::from(bytes),
            outbound: Vec::new(),
            closed: true,
        }
    }

    /// Transport whose peer sent `bytes` and then went quiet
    pub fn open(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            closed: false,
            ..Self::closed(bytes)
        }
    }

    pub fn push_inbound(&mut self, bytes: &[u8]) {
        self.inbound.extend(bytes);
    }

    /// Bytes not yet consumed by a read
    pub fn remaining(&self) -> usize {
        self.inbound.len()
    }

    /// Everything written so far
    pub fn written(&self) -> &[u8] {
        &self.outbound
    }
}

impl Transport for MemoryTransport {
    fn read(&mut self, min: usize, max: usize, _timeout: Duration) -> io::Result<Vec<u8>> {
        if self.inbound.len() < min {
            let available = self.inbound.len();
            if self.closed {
                self.inbound.clear();
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("peer closed after {available} of {min} bytes"),
                ));
            }
            return Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("only {available} of {min} bytes arrived"),
            ));
        }
        let take = self.inbound.len().min(max.max(min));
        Ok(self.inbound.drain(..take).collect())
    }

    fn write_all(&mut self, bytes: &[u8], _timeout: Duration) -> io::Result<()> {
        self.outbound.extend_from_slice(bytes);
        Ok(())
    }
}

//! CDR subset used by message bodies
//!
//! Only the primitives the framing layer itself needs: octets, booleans,
//! shorts, longs, strings, octet sequences and encapsulations. Alignment is
//! measured from the start of the message, so a reader over a body starts
//! at offset 12; an encapsulation restarts alignment at its own first octet.
//!
//! Strings are ISO 8859-1 with a length that includes the terminating NUL.
//! A zero length is accepted as the empty string, which some peers send
//! instead of `1, NUL`.

use crate::error::{ProtocolError, ProtocolResult};
use byteorder::{BigEndian, ByteOrder as Endianness, LittleEndian};
use giop_types::{ByteOrder, GIOP_HEADER_SIZE};

/// Cursor over a body or encapsulation
#[derive(Debug, Clone)]
pub struct CdrReader<'a> {
    buf: &'a [u8],
    pos: usize,
    base: usize,
    byte_order: ByteOrder,
}

impl<'a> CdrReader<'a> {
    /// Reader over a message body; the first byte sits at message offset 12
    pub fn for_body(body: &'a [u8], byte_order: ByteOrder) -> Self {
        Self {
            buf: body,
            pos: 0,
            base: GIOP_HEADER_SIZE,
            byte_order,
        }
    }

    /// Reader over an encapsulation; the leading octet selects the byte order
    pub fn for_encapsulation(data: &'a [u8]) -> ProtocolResult<Self> {
        let first = *data
            .first()
            .ok_or_else(|| ProtocolError::marshal(0, "empty encapsulation"))?;
        let byte_order = match first {
            0 => ByteOrder::BigEndian,
            1 => ByteOrder::LittleEndian,
            other => {
                return Err(ProtocolError::InvalidEnumValue {
                    type_name: "encapsulation byte order",
                    value: i64::from(other),
                    offset: 0,
                })
            }
        };
        Ok(Self {
            buf: data,
            pos: 1,
            base: 0,
            byte_order,
        })
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Offset within the buffer being read
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Skip padding so the next read starts on a multiple of `boundary`
    pub fn align(&mut self, boundary: usize) -> ProtocolResult<()> {
        let pad = padding(self.base + self.pos, boundary);
        self.take(pad, "alignment padding").map(|_| ())
    }

    fn take(&mut self, n: usize, what: &str) -> ProtocolResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(ProtocolError::marshal(
                self.pos,
                format!(
                    "truncated {}: need {} bytes, {} left",
                    what,
                    n,
                    self.remaining()
                ),
            ));
        }
        let buf: &'a [u8] = self.buf;
        let slice = &buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_octet(&mut self) -> ProtocolResult<u8> {
        Ok(self.take(1, "octet")?[0])
    }

    pub fn read_bool(&mut self) -> ProtocolResult<bool> {
        let offset = self.pos;
        match self.read_octet()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(ProtocolError::InvalidEnumValue {
                type_name: "boolean",
                value: i64::from(other),
                offset,
            }),
        }
    }

    pub fn read_short(&mut self) -> ProtocolResult<i16> {
        Ok(self.read_ushort()? as i16)
    }

    pub fn read_ushort(&mut self) -> ProtocolResult<u16> {
        self.align(2)?;
        let bytes = self.take(2, "short")?;
        Ok(match self.byte_order {
            ByteOrder::BigEndian => BigEndian::read_u16(bytes),
            ByteOrder::LittleEndian => LittleEndian::read_u16(bytes),
        })
    }

    pub fn read_ulong(&mut self) -> ProtocolResult<u32> {
        self.align(4)?;
        let bytes = self.take(4, "long")?;
        Ok(match self.byte_order {
            ByteOrder::BigEndian => BigEndian::read_u32(bytes),
            ByteOrder::LittleEndian => LittleEndian::read_u32(bytes),
        })
    }

    pub fn read_long(&mut self) -> ProtocolResult<i32> {
        Ok(self.read_ulong()? as i32)
    }

    /// Raw octets with no length prefix
    pub fn read_octets(&mut self, n: usize) -> ProtocolResult<&'a [u8]> {
        self.take(n, "octet array")
    }

    /// Everything not yet consumed
    pub fn read_rest(&mut self) -> &'a [u8] {
        let buf: &'a [u8] = self.buf;
        let rest = &buf[self.pos..];
        self.pos = buf.len();
        rest
    }

    pub fn read_octet_seq(&mut self) -> ProtocolResult<Vec<u8>> {
        let len = self.read_length("octet sequence")?;
        Ok(self.take(len, "octet sequence")?.to_vec())
    }

    pub fn read_string(&mut self) -> ProtocolResult<String> {
        let len = self.read_length("string")?;
        if len == 0 {
            return Ok(String::new());
        }
        let offset = self.pos;
        let bytes = self.take(len, "string")?;
        let (text, nul) = bytes.split_at(len - 1);
        if nul[0] != 0 {
            return Err(ProtocolError::marshal(offset, "string is not NUL terminated"));
        }
        Ok(text.iter().map(|&b| char::from(b)).collect())
    }

    /// Sequence/string length; negative values and lengths beyond the
    /// buffer are rejected before anything is allocated
    fn read_length(&mut self, what: &str) -> ProtocolResult<usize> {
        let offset = self.pos;
        let raw = self.read_long()?;
        if raw < 0 {
            return Err(ProtocolError::marshal(
                offset,
                format!("negative {} length {}", what, raw),
            ));
        }
        let len = raw as usize;
        if len > self.remaining() {
            return Err(ProtocolError::marshal(
                offset,
                format!(
                    "{} length {} exceeds remaining {} bytes",
                    what,
                    len,
                    self.remaining()
                ),
            ));
        }
        Ok(len)
    }
}

/// Growing output buffer with the same alignment rules as [`CdrReader`]
#[derive(Debug, Clone)]
pub struct CdrWriter {
    buf: Vec<u8>,
    base: usize,
    byte_order: ByteOrder,
}

impl CdrWriter {
    /// Writer for a message body that will follow the 12-byte header
    pub fn for_body(byte_order: ByteOrder) -> Self {
        Self {
            buf: Vec::new(),
            base: GIOP_HEADER_SIZE,
            byte_order,
        }
    }

    /// Writer for an encapsulation; emits the byte order octet first
    pub fn for_encapsulation(byte_order: ByteOrder) -> Self {
        Self {
            buf: vec![byte_order.flag_bit()],
            base: 0,
            byte_order,
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn align(&mut self, boundary: usize) {
        let pad = padding(self.base + self.buf.len(), boundary);
        self.buf.resize(self.buf.len() + pad, 0);
    }

    pub fn write_octet(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(u8::from(value));
    }

    pub fn write_short(&mut self, value: i16) {
        self.write_ushort(value as u16);
    }

    pub fn write_ushort(&mut self, value: u16) {
        self.align(2);
        let mut bytes = [0u8; 2];
        match self.byte_order {
            ByteOrder::BigEndian => BigEndian::write_u16(&mut bytes, value),
            ByteOrder::LittleEndian => LittleEndian::write_u16(&mut bytes, value),
        }
        self.buf.extend_from_slice(&bytes);
    }

    pub fn write_ulong(&mut self, value: u32) {
        self.align(4);
        let mut bytes = [0u8; 4];
        match self.byte_order {
            ByteOrder::BigEndian => BigEndian::write_u32(&mut bytes, value),
            ByteOrder::LittleEndian => LittleEndian::write_u32(&mut bytes, value),
        }
        self.buf.extend_from_slice(&bytes);
    }

    pub fn write_long(&mut self, value: i32) {
        self.write_ulong(value as u32);
    }

    pub fn write_octets(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_octet_seq(&mut self, bytes: &[u8]) -> ProtocolResult<()> {
        self.write_length(bytes.len())?;
        self.write_octets(bytes);
        Ok(())
    }

    /// Write an ISO 8859-1 string; characters above U+00FF cannot be encoded
    pub fn write_string(&mut self, text: &str) -> ProtocolResult<()> {
        let mut latin1 = Vec::with_capacity(text.len() + 1);
        for ch in text.chars() {
            let code = u32::from(ch);
            if code > 0xFF {
                return Err(ProtocolError::marshal(
                    self.buf.len(),
                    format!("character {:?} is not ISO 8859-1", ch),
                ));
            }
            latin1.push(code as u8);
        }
        latin1.push(0);
        self.write_length(latin1.len())?;
        self.write_octets(&latin1);
        Ok(())
    }

    fn write_length(&mut self, len: usize) -> ProtocolResult<()> {
        let len = u32::try_from(len)
            .ok()
            .filter(|l| *l <= i32::MAX as u32)
            .ok_or_else(|| {
                ProtocolError::marshal(self.buf.len(), format!("length {} too large", len))
            })?;
        self.write_ulong(len);
        Ok(())
    }
}

fn padding(offset: usize, boundary: usize) -> usize {
    if boundary <= 1 {
        return 0;
    }
    (boundary - offset % boundary) % boundary
}

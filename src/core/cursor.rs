//! Sequential reader over a raw byte buffer.
//!
//! Both protocols are little-endian on the wire; every fixed-width read here
//! consumes LE integers and advances the read offset. A read past the end of
//! the buffer fails with [`ProtocolError::Underflow`] rather than panicking,
//! since truncated datagrams are an expected failure mode.

use crate::error::{ProtocolError, Result};

/// Cursor over the most recent inbound frame.
///
/// Created fresh (or rewound via [`ByteCursor::write`]) per receive
/// operation; read once, then discarded for the next logical packet. The
/// read offset never exceeds the buffer length.
#[derive(Debug, Default)]
pub struct ByteCursor {
    buf: Vec<u8>,
    pos: usize,
}

impl ByteCursor {
    pub fn new(buf: Vec<u8>) -> Self {
        Self { buf, pos: 0 }
    }

    /// Replace the buffer contents and rewind, preparing the cursor for the
    /// next inbound frame.
    pub fn write(&mut self, bytes: &[u8]) {
        self.buf.clear();
        self.buf.extend_from_slice(bytes);
        self.pos = 0;
    }

    /// Current read offset.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Count of unread bytes.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&[u8]> {
        if self.remaining() < n {
            return Err(ProtocolError::Underflow {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let start = self.pos;
        self.pos += n;
        Ok(&self.buf[start..self.pos])
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.read_u32().map(|v| v as i32)
    }

    /// All bytes from the current offset to the end of the buffer,
    /// consuming them.
    pub fn remaining_bytes(&mut self) -> Vec<u8> {
        let rest = self.buf[self.pos..].to_vec();
        self.pos = self.buf.len();
        rest
    }
}

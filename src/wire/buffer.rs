//! Growable big-endian request buffer.
//!
//! Requests are assembled completely in memory and handed to the
//! transport as a single write, so each round trip is one
//! write-flush-await sequence.

use bytes::{BufMut, Bytes, BytesMut};

use crate::ebcdic;
use crate::error::Result;

/// Byte buffer with the big-endian primitives the wire format uses.
#[derive(Debug, Default)]
pub struct RequestBuffer {
    buf: BytesMut,
}

impl RequestBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Append a single byte.
    pub fn write_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    /// Append a big-endian 16-bit value.
    pub fn write_u16(&mut self, value: u16) {
        self.buf.put_u16(value);
    }

    /// Append a big-endian 32-bit value.
    pub fn write_u32(&mut self, value: u32) {
        self.buf.put_u32(value);
    }

    /// Append a big-endian signed 32-bit value.
    pub fn write_i32(&mut self, value: i32) {
        self.buf.put_i32(value);
    }

    /// Append a big-endian 64-bit value.
    pub fn write_u64(&mut self, value: u64) {
        self.buf.put_u64(value);
    }

    /// Append raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    /// Append `text` as EBCDIC, blank-padded to exactly `width` bytes.
    pub fn write_ebcdic_pad(&mut self, text: &str, width: usize) -> Result<()> {
        let encoded = ebcdic::from_str_padded(text, width)?;
        self.buf.put_slice(&encoded);
        Ok(())
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// View the written bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the buffer into immutable bytes ready to send.
    pub fn freeze(self) -> Bytes {
        self.buf.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_big_endian_layout() {
        let mut buf = RequestBuffer::new();
        buf.write_u32(28);
        buf.write_u8(1);
        buf.write_u16(0xE004);
        buf.write_u64(0x0102_0304_0506_0708);

        assert_eq!(
            buf.as_slice(),
            hex!("0000001C 01 E004 0102030405060708")
        );
    }

    #[test]
    fn test_ebcdic_padding() {
        let mut buf = RequestBuffer::new();
        buf.write_ebcdic_pad("QUSER", 10).unwrap();
        assert_eq!(buf.len(), 10);
        assert_eq!(buf.as_slice()[0], 0xD8); // Q
        assert_eq!(buf.as_slice()[9], 0x40); // blank fill
    }
}

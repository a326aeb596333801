//! Append-only little-endian byte buffer.

use bytes::{BufMut, BytesMut};

/// Capacity grows in multiples of this many bytes.
pub const BLOCK_SIZE: usize = 4096;

/// An append-only buffer with typed little-endian writes.
///
/// Every write returns the byte offset at which the written value begins.
/// Offsets stay valid for the lifetime of the writer.
#[derive(Debug, Default, Clone)]
pub struct BufferWriter {
    buf: BytesMut,
}

impl BufferWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(BLOCK_SIZE),
        }
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Writes a single byte.
    pub fn byte(&mut self, value: u8) -> usize {
        self.reserve(1);
        let offset = self.len();
        self.buf.put_u8(value);
        offset
    }

    /// Writes a 32-bit unsigned integer.
    pub fn uint(&mut self, value: u32) -> usize {
        self.reserve(4);
        let offset = self.len();
        self.buf.put_u32_le(value);
        offset
    }

    /// Writes a 64-bit float.
    pub fn double(&mut self, value: f64) -> usize {
        self.reserve(8);
        let offset = self.len();
        self.buf.put_f64_le(value);
        offset
    }

    /// Writes a string as UTF-16 code units after padding to a 4-byte
    /// boundary. The u32 prefix counts code units; the returned offset is
    /// the position of that prefix.
    pub fn string(&mut self, value: &str) -> usize {
        self.align(4);
        let units: Vec<u16> = value.encode_utf16().collect();
        self.reserve(4 + units.len() * 2);
        let offset = self.len();
        self.buf.put_u32_le(units.len() as u32);
        for unit in units {
            self.buf.put_u16_le(unit);
        }
        offset
    }

    /// Writes raw bytes.
    pub fn raw(&mut self, bytes: &[u8]) -> usize {
        self.reserve(bytes.len());
        let offset = self.len();
        self.buf.put_slice(bytes);
        offset
    }

    /// Zero-pads the length up to a multiple of `size`.
    pub fn align(&mut self, size: usize) {
        let padding = self.len().next_multiple_of(size) - self.len();
        if padding > 0 {
            self.reserve(padding);
            self.buf.put_bytes(0, padding);
        }
    }

    /// Consumes the writer, returning its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf.to_vec()
    }

    fn reserve(&mut self, additional: usize) {
        let needed = self.buf.len() + additional;
        let capacity = self.buf.capacity();
        if needed > capacity {
            let target = needed.next_multiple_of(BLOCK_SIZE);
            self.buf.reserve(target - self.buf.len());
        }
    }
}

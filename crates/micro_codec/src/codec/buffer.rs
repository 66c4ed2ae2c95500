//! # Byte Cursors
//!
//! Big-endian primitives for the encoder and decoder.
//!
//! ## Design
//!
//! - `ByteWriter` is bounded: a write that would pass the limit writes
//!   nothing and returns `false`
//! - `ByteReader` returns `None` on a short read and does not advance

/// Bounded writer over a growable buffer.
#[derive(Debug, Clone)]
pub struct ByteWriter {
    buffer: Vec<u8>,
    limit: usize,
}

impl ByteWriter {
    /// Creates a writer that accepts at most `limit` bytes.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(limit.min(4096)),
            limit,
        }
    }

    /// Returns the number of bytes written.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if no bytes have been written.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Returns the number of bytes that can still be written.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.buffer.len())
    }

    /// Returns a slice of the written data.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Consumes the writer, returning the written bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Writes raw bytes, all or nothing.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) -> bool {
        if bytes.len() > self.remaining() {
            return false;
        }
        self.buffer.extend_from_slice(bytes);
        true
    }

    /// Writes a single byte.
    #[inline]
    pub fn write_u8(&mut self, value: u8) -> bool {
        self.write_bytes(&[value])
    }

    /// Writes a u16 in big-endian format.
    #[inline]
    pub fn write_u16(&mut self, value: u16) -> bool {
        self.write_bytes(&value.to_be_bytes())
    }

    /// Writes an f64 in big-endian format.
    #[inline]
    pub fn write_f64(&mut self, value: f64) -> bool {
        self.write_bytes(&value.to_be_bytes())
    }

    /// Writes the low `width` bytes of `value` in big-endian format.
    ///
    /// `width` is 1, 2, 4 or 8; the caller clamps `value` to that range.
    #[inline]
    pub fn write_int(&mut self, value: i128, width: usize) -> bool {
        let bytes = value.to_be_bytes();
        match bytes.len().checked_sub(width) {
            Some(start) => self.write_bytes(&bytes[start..]),
            None => false,
        }
    }

    /// Appends zero bytes up to `count`, or as many as fit.
    #[inline]
    pub fn pad(&mut self, count: usize) {
        let count = count.min(self.remaining());
        self.buffer.resize(self.buffer.len() + count, 0);
    }
}

/// Reader over a borrowed buffer.
#[derive(Debug, Clone, Copy)]
pub struct ByteReader<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> ByteReader<'a> {
    /// Creates a reader from a buffer.
    #[must_use]
    pub const fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, position: 0 }
    }

    /// Returns the number of bytes consumed.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Returns the number of bytes remaining.
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    /// Returns the unread bytes without consuming them.
    #[inline]
    #[must_use]
    pub fn rest(&self) -> &'a [u8] {
        &self.buffer[self.position.min(self.buffer.len())..]
    }

    /// Reads `count` bytes.
    #[inline]
    pub fn read_bytes(&mut self, count: usize) -> Option<&'a [u8]> {
        if count > self.remaining() {
            return None;
        }
        let slice = &self.buffer[self.position..self.position + count];
        self.position += count;
        Some(slice)
    }

    /// Skips up to `count` bytes.
    #[inline]
    pub fn skip(&mut self, count: usize) {
        self.position += count.min(self.remaining());
    }

    /// Reads a single byte.
    #[inline]
    pub fn read_u8(&mut self) -> Option<u8> {
        self.read_bytes(1).map(|b| b[0])
    }

    /// Reads a u16 in big-endian format.
    #[inline]
    pub fn read_u16(&mut self) -> Option<u16> {
        self.read_bytes(2).map(|b| u16::from_be_bytes([b[0], b[1]]))
    }

    /// Reads an f64 in big-endian format.
    #[inline]
    pub fn read_f64(&mut self) -> Option<f64> {
        let bytes = self.read_bytes(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Some(f64::from_be_bytes(raw))
    }

    /// Reads a `width`-byte big-endian integer.
    #[inline]
    pub fn read_int(&mut self, width: usize, unsigned: bool) -> Option<i128> {
        if width == 0 || width > 8 {
            return None;
        }
        let bytes = self.read_bytes(width)?;
        let fill = if !unsigned && bytes[0] & 0x80 != 0 { 0xFF } else { 0x00 };
        let mut raw = [fill; 16];
        raw[16 - width..].copy_from_slice(bytes);
        Some(i128::from_be_bytes(raw))
    }
}

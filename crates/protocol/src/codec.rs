//! Big-endian primitive encoders/decoders for SFTP wire values.
//!
//! [`Reader`] walks a borrowed byte slice; every read either advances the
//! cursor or leaves it untouched and returns a [`DecodeError`]. Decode
//! errors are recoverable — the caller turns them into a
//! `SSH_FX_BAD_MESSAGE` response (see [`crate::status`]) rather than
//! tearing down the connection.
//!
//! [`Writer`] appends to an owned `Vec<u8>`. `begin_sub`/`end_sub` implement
//! the sub-block idiom: reserve four bytes for a length, write the nested
//! packet, then back-patch the reserved slot once its size is known.

use thiserror::Error;

/// A field could not be decoded from the buffer.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum DecodeError {
    /// Fewer bytes remained than the primitive requires.
    #[error("short read: need {needed} bytes, {available} available")]
    ShortRead {
        /// Bytes required to decode the primitive.
        needed: usize,
        /// Bytes actually remaining in the buffer.
        available: usize,
    },
    /// A `string`'s declared length exceeds the bytes remaining in the
    /// buffer.
    #[error("declared string length {declared} exceeds remaining buffer of {available} bytes")]
    LengthExceedsBuffer {
        /// Length prefix read from the wire.
        declared: u32,
        /// Bytes actually remaining.
        available: usize,
    },
    /// A reserved value forbidden by the active protocol version was seen.
    #[error("reserved value {0:#x} is not legal in this protocol version")]
    ReservedValue(u32),
}

/// A cursor over a borrowed request payload.
#[derive(Clone, Debug)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Wraps `buf` for sequential decoding starting at offset 0.
    #[must_use]
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Returns `true` once every byte has been consumed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < len {
            return Err(DecodeError::ShortRead {
                needed: len,
                available: self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    /// Decodes an unsigned 8-bit integer.
    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    /// Decodes a big-endian unsigned 16-bit integer.
    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        let bytes = self.take(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Decodes a big-endian unsigned 32-bit integer.
    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Decodes a big-endian unsigned 64-bit integer.
    pub fn read_u64(&mut self) -> Result<u64, DecodeError> {
        let bytes = self.take(8)?;
        Ok(u64::from_be_bytes(bytes.try_into().expect("8 bytes taken")))
    }

    /// Decodes a 32-bit-length-prefixed byte string. The contents may be
    /// arbitrary binary and are not required to be valid UTF-8.
    pub fn read_string(&mut self) -> Result<&'a [u8], DecodeError> {
        let len = self.read_u32()?;
        if len as usize > self.remaining() {
            return Err(DecodeError::LengthExceedsBuffer {
                declared: len,
                available: self.remaining(),
            });
        }
        self.take(len as usize)
    }

    /// Decodes an opaque file handle. Handles are `string`s whose contents
    /// are defined entirely by the handle-issuing collaborator; the codec
    /// does not interpret them.
    pub fn read_handle(&mut self) -> Result<&'a [u8], DecodeError> {
        self.read_string()
    }
}

/// An append-only response buffer.
#[derive(Debug, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuses an existing buffer, clearing it first. Worker response
    /// buffers are recycled across jobs rather than reallocated.
    pub fn reset(&mut self) {
        self.buf.clear();
    }

    /// Returns the encoded bytes so far.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the writer, returning the backing buffer.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }

    /// Appends an unsigned 8-bit integer.
    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    /// Appends a big-endian unsigned 16-bit integer.
    pub fn write_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Appends a big-endian unsigned 32-bit integer.
    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Appends a big-endian unsigned 64-bit integer.
    pub fn write_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Appends a 32-bit-length-prefixed byte string.
    pub fn write_string(&mut self, bytes: &[u8]) {
        self.write_u32(bytes.len() as u32);
        self.buf.extend_from_slice(bytes);
    }

    /// Appends a handle, which is wire-identical to a `string`.
    pub fn write_handle(&mut self, handle: &[u8]) {
        self.write_string(handle);
    }

    /// Reserves four bytes for a sub-block length and returns the offset of
    /// that reservation, to be passed to [`Writer::end_sub`] once the
    /// nested packet has been written.
    pub fn begin_sub(&mut self) -> usize {
        let offset = self.buf.len();
        self.buf.extend_from_slice(&[0u8; 4]);
        offset
    }

    /// Back-patches the length reserved at `offset` with the number of
    /// bytes written since.
    pub fn end_sub(&mut self, offset: usize) {
        let len = (self.buf.len() - offset - 4) as u32;
        self.buf[offset..offset + 4].copy_from_slice(&len.to_be_bytes());
    }
}

//! Length-prefixed packet I/O over a `Read`/`Write` transport.
//!
//! Every SFTP packet on the wire is a 32-bit big-endian length followed by
//! that many bytes of payload. A length of zero is illegal and ends the
//! connection; anything else is read in full before dispatch ever sees it,
//! so handlers never have to worry about partial packets.

use std::io::{self, Read, Write};

use crate::error::ProtocolError;

/// Reads framed packets from `R`.
pub struct PacketReader<R> {
    inner: R,
}

impl<R: Read> PacketReader<R> {
    /// Wraps a transport for framed reads.
    pub const fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Reads the next packet's payload, or `None` at a clean EOF between
    /// packets (the peer closed the connection and no length prefix was
    /// even started).
    pub fn read_packet(&mut self) -> Result<Option<Vec<u8>>, ProtocolError> {
        let mut len_bytes = [0u8; 4];
        if let Err(err) = self.inner.read_exact(&mut len_bytes) {
            return if err.kind() == io::ErrorKind::UnexpectedEof {
                Ok(None)
            } else {
                Err(ProtocolError::Io(err))
            };
        }
        let len = u32::from_be_bytes(len_bytes);
        if len == 0 {
            return Err(ProtocolError::EmptyPacket);
        }
        let mut payload = vec![0u8; len as usize];
        self.inner.read_exact(&mut payload).map_err(|err| {
            if err.kind() == io::ErrorKind::UnexpectedEof {
                ProtocolError::Truncated
            } else {
                ProtocolError::Io(err)
            }
        })?;
        Ok(Some(payload))
    }
}

/// Writes framed packets to `W`.
pub struct PacketWriter<W> {
    inner: W,
}

impl<W: Write> PacketWriter<W> {
    /// Wraps a transport for framed writes.
    pub const fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Writes one length-prefixed packet.
    ///
    /// A broken pipe (the peer closed its read side) is swallowed here
    /// rather than propagated: it means this one response has nowhere to
    /// go, not that every other in-flight job should be aborted. Any other
    /// write failure is fatal and ends the connection.
    pub fn write_packet(&mut self, payload: &[u8]) -> Result<(), ProtocolError> {
        let len = u32::try_from(payload.len()).expect("response fits in u32");
        match self
            .inner
            .write_all(&len.to_be_bytes())
            .and_then(|()| self.inner.write_all(payload))
            .and_then(|()| self.inner.flush())
        {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
            Err(err) => Err(ProtocolError::Io(err)),
        }
    }
}

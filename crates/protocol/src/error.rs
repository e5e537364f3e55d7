//! Fatal, connection-terminating errors.
//!
//! Everything that can be repaired with a STATUS response lives in
//! [`crate::codec::DecodeError`] instead. A [`ProtocolError`] always means
//! the connection is over.

use std::io;

use thiserror::Error;

/// An error that terminates the connection rather than producing a STATUS
/// response.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A packet declared a zero-length payload. Length 0 is illegal per the
    /// framing rules; the peer is not playing fair.
    #[error("zero-length packet")]
    EmptyPacket,

    /// The stream ended in the middle of a length prefix or payload.
    #[error("unexpected end of stream while reading a framed packet")]
    Truncated,

    /// INIT was received while the active table was already versioned, or a
    /// second INIT arrived on the same connection.
    #[error("INIT received outside the pre-init state")]
    UnexpectedInit,

    /// The underlying transport failed for a reason other than a closed
    /// pipe on write (`EPIPE`, which is reported to the caller as a
    /// recoverable condition on that single write, not a fatal one).
    #[error("transport I/O error: {0}")]
    Io(#[from] io::Error),
}

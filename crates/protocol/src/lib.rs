#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `protocol` implements the SFTP protocol engine: message framing, the
//! version-negotiation state machine, command dispatch, the per-handle
//! serialization discipline that lets independent requests run in parallel,
//! and the protocol-version-parameterised status/error translation layer.
//!
//! The crate does not know how to open a file or read a directory. Those
//! operations are external collaborators reached through the [`handler`]
//! module's `CommandEntry` function-pointer table, which a host crate (see
//! `daemon`) builds and feeds back into [`tables::ProtocolTable::new`].
//!
//! # Design
//!
//! - [`codec`] — big-endian primitive encode/decode on byte buffers.
//! - [`packet`] — SFTP message type and status code constants.
//! - [`framer`] — length-prefixed packet I/O over a `Read`/`Write` pair.
//! - [`tables`] — the five immutable dispatch tables (pre-init, v3..v6).
//! - [`job`] — the in-flight request: cursor, id, and response buffer.
//! - [`dispatch`] — binds a parsed request to its handler and runs the INIT
//!   negotiation state machine.
//! - [`gate`] — per-handle FIFO ordering across a parallel worker pool.
//! - [`worker`] — the fixed-size worker pool and per-worker encoder state.
//! - [`status`] — handler status and OS error translation into STATUS
//!   responses.
//! - [`convert`] — the local-encoding/UTF-8 conversion collaborator
//!   interface, with an [`encoding_rs`](https://docs.rs/encoding_rs)-backed
//!   default implementation behind the `iconv` feature.
//!
//! # Invariants
//!
//! - Exactly one successful INIT per connection; the active table pointer
//!   advances exactly once from pre-init to a versioned table.
//! - While the active table is pre-init, no worker pool exists and all jobs
//!   run on the reader thread.
//! - A request id is echoed verbatim in its response; INIT's response
//!   (VERSION) carries no id.
//! - No response status exceeds the active table's `maxstatus`.
//! - Two jobs that reference the same open handle run in framer-receive
//!   order.
//!
//! # Errors
//!
//! Malformed packet *fields* (short reads inside a payload, a declared
//! length exceeding the buffer) are recoverable: they are translated into a
//! `SSH_FX_BAD_MESSAGE` response by [`status`] and never escape as Rust
//! errors. Only framing failures (zero-length packet, truncated length
//! prefix, a write error other than `EPIPE`) escape as
//! [`error::ProtocolError`] and end the connection.

pub mod codec;
pub mod convert;
pub mod dispatch;
pub mod error;
pub mod framer;
pub mod gate;
pub mod handler;
pub mod job;
pub mod packet;
pub mod status;
pub mod tables;
pub mod worker;

pub use dispatch::{Dispatched, Engine};
pub use error::ProtocolError;
pub use handler::{CommandEntry, HandlerContext, HandlerFn, Outcome};
pub use job::Job;
pub use status::Status;
pub use tables::{ProtocolTable, TableSet};

//! Command dispatch and the INIT version-negotiation state machine.
//!
//! [`Engine`] is the single piece of mutable per-connection state: which
//! table is active, whether the worker pool exists yet, and the shared
//! [`Gate`] and [`Converter`] every job needs. The reader thread feeds it
//! one framed packet at a time via [`Engine::dispatch`]; most results come
//! back inline, but once negotiation settles on a worker pool, job results
//! arrive asynchronously on the channel the caller supplied at
//! construction.

use std::sync::mpsc::Sender;
use std::sync::Arc;

use crate::codec::{Reader, Writer};
use crate::convert::Converter;
use crate::error::ProtocolError;
use crate::gate::Gate;
use crate::handler::{HandlerContext, Outcome};
use crate::job::Job;
use crate::packet;
use crate::status::Status;
use crate::tables::{ProtocolTable, TableSet};
use crate::worker::WorkerPool;

/// What came out of feeding one packet to [`Engine::dispatch`].
pub enum Dispatched {
    /// Ready to write to the client immediately.
    Inline(Vec<u8>),
    /// Handed to the worker pool; its response arrives later on the
    /// channel passed to [`Engine::new`].
    Queued,
}

enum State {
    PreInit,
    /// Negotiated to v6 but the pool isn't up yet: the next request (which
    /// might be `version-select`) still has to run single-threaded.
    AwaitingPoolStart(ProtocolTable),
    Active(ProtocolTable),
}

/// Per-connection dispatch state.
pub struct Engine {
    tables: TableSet,
    state: State,
    gate: Arc<Gate>,
    converter: Arc<dyn Converter>,
    worker_count: usize,
    readonly: bool,
    pool: Option<WorkerPool>,
    results: Sender<Job>,
}

impl Engine {
    /// Builds an engine in the pre-init state. `results` is where worker
    /// pool output lands; the caller owns the matching receiver and writes
    /// completed jobs back to the client as they arrive. `readonly` is
    /// forwarded to every handler via [`HandlerContext::readonly`]; the
    /// engine itself never inspects it.
    #[must_use]
    pub fn new(
        tables: TableSet,
        converter: Arc<dyn Converter>,
        worker_count: usize,
        results: Sender<Job>,
        readonly: bool,
    ) -> Self {
        Self {
            tables,
            state: State::PreInit,
            gate: Arc::new(Gate::new()),
            converter,
            worker_count,
            readonly,
            pool: None,
            results,
        }
    }

    /// Feeds one framed packet through the dispatch pipeline.
    ///
    /// # Errors
    ///
    /// Only [`ProtocolError::UnexpectedInit`] can originate here; malformed
    /// fields are reported as STATUS responses, never as an `Err`.
    pub fn dispatch(&mut self, raw: &[u8]) -> Result<Dispatched, ProtocolError> {
        let (message_type, id, fields) = match split_header(raw)? {
            Header::Init(fields) => return self.handle_init(fields),
            // A type byte arrived but the id field is short or missing.
            // Recoverable: reply BAD_MESSAGE with id 0 and keep the
            // connection open, the same way the original C
            // `process_sftpjob` answers a missing ID field rather than
            // dropping the session.
            Header::MalformedId => {
                return Ok(Dispatched::Inline(status_packet(0, Status::BadMessage, 3)));
            }
            Header::Request { message_type, id, fields } => (message_type, id, fields),
        };

        match &self.state {
            // The pre-init table holds only INIT; anything else is a table
            // miss, answered the same way a miss against any other table
            // would be: OP_UNSUPPORTED, not BAD_MESSAGE.
            State::PreInit => Ok(Dispatched::Inline(status_packet(
                id,
                Status::OpUnsupported,
                3,
            ))),
            State::AwaitingPoolStart(table) => {
                let table = *table;
                let mut job = Job::new(message_type, id, fields.to_vec());
                if let Some(handle) = handle_for_gate(message_type, fields) {
                    job.set_reservation(self.gate.reserve(&handle));
                }
                let finished =
                    execute(&table, &self.gate, self.converter.as_ref(), self.readonly, job);
                let response = finished.into_response();
                self.start_pool(table);
                Ok(Dispatched::Inline(response))
            }
            State::Active(table) => {
                let table = *table;
                let mut job = Job::new(message_type, id, fields.to_vec());
                if let Some(handle) = handle_for_gate(message_type, fields) {
                    job.set_reservation(self.gate.reserve(&handle));
                }
                match self
                    .pool
                    .as_ref()
                    .expect("pool exists once Active")
                    .submit(job)
                {
                    Ok(()) => Ok(Dispatched::Queued),
                    Err(job) => {
                        let finished = execute(
                            &table,
                            &self.gate,
                            self.converter.as_ref(),
                            self.readonly,
                            job,
                        );
                        Ok(Dispatched::Inline(finished.into_response()))
                    }
                }
            }
        }
    }

    fn handle_init(&mut self, fields: &[u8]) -> Result<Dispatched, ProtocolError> {
        if !matches!(self.state, State::PreInit) {
            return Err(ProtocolError::UnexpectedInit);
        }

        let client_version = Reader::new(fields).read_u32().unwrap_or(0);

        if client_version < 3 {
            return Ok(Dispatched::Inline(status_packet(0, Status::OpUnsupported, 3)));
        }

        let version = client_version.min(self.tables.max_supported());
        let table = self
            .tables
            .select(version)
            .expect("client_version clamped into 3..=6");

        #[cfg(feature = "tracing")]
        tracing::info!(client_version, negotiated = version, "SFTP version negotiated");

        let response = build_version_response(table.version());

        if table.version() == 6 {
            self.state = State::AwaitingPoolStart(*table);
        } else {
            let table = *table;
            self.start_pool(table);
        }

        Ok(Dispatched::Inline(response))
    }

    fn start_pool(&mut self, table: ProtocolTable) {
        let gate = Arc::clone(&self.gate);
        let converter = Arc::clone(&self.converter);
        let results = self.results.clone();
        let readonly = self.readonly;
        let process = move |job: Job| execute(&table, &gate, converter.as_ref(), readonly, job);
        self.pool = Some(WorkerPool::new(self.worker_count, Arc::new(process), results));
        self.state = State::Active(table);
    }
}

/// The result of splitting a framed packet into its header fields.
enum Header<'a> {
    Init(&'a [u8]),
    Request { message_type: u8, id: u32, fields: &'a [u8] },
    /// A type byte is present but the 32-bit id field is short or absent.
    /// Not a transport-level truncation: the framer already delivered a
    /// complete, correctly-length-prefixed packet, it's just too short to
    /// hold an id. Recoverable at the dispatch level.
    MalformedId,
}

fn split_header(raw: &[u8]) -> Result<Header<'_>, ProtocolError> {
    let message_type = *raw.first().ok_or(ProtocolError::EmptyPacket)?;
    if message_type == packet::SSH_FXP_INIT {
        return Ok(Header::Init(&raw[1..]));
    }
    if raw.len() < 5 {
        return Ok(Header::MalformedId);
    }
    let id = u32::from_be_bytes([raw[1], raw[2], raw[3], raw[4]]);
    Ok(Header::Request { message_type, id, fields: &raw[5..] })
}

/// Message types whose first field is a handle, for [`Gate`] purposes.
/// `EXTENDED` is handled separately since gating there depends on which
/// extension is named.
fn handle_for_gate(message_type: u8, fields: &[u8]) -> Option<Vec<u8>> {
    let takes_handle = matches!(
        message_type,
        packet::SSH_FXP_CLOSE
            | packet::SSH_FXP_READ
            | packet::SSH_FXP_WRITE
            | packet::SSH_FXP_FSTAT
            | packet::SSH_FXP_FSETSTAT
            | packet::SSH_FXP_READDIR
            | packet::SSH_FXP_BLOCK
            | packet::SSH_FXP_UNBLOCK
    );
    if !takes_handle {
        if message_type == packet::SSH_FXP_EXTENDED {
            let mut reader = Reader::new(fields);
            let name = reader.read_string().ok()?;
            if name == b"fsync@openssh.com" {
                return reader.read_handle().ok().map(<[u8]>::to_vec);
            }
        }
        return None;
    }
    Reader::new(fields).read_handle().ok().map(<[u8]>::to_vec)
}

fn execute(
    table: &ProtocolTable,
    gate: &Gate,
    converter: &dyn Converter,
    readonly: bool,
    mut job: Job,
) -> Job {
    let message_type = job.message_type();
    let id = job.id();
    let version = table.version();

    // The reservation, if any, was taken on the reader thread in receive
    // order; this only waits out the ticket's turn, it never assigns one.
    let ticket = job.take_reservation().map(|reservation| gate.admit(reservation));

    let status = match table.lookup(message_type) {
        Some(entry) => {
            let body = job.body();
            let out = job.writer_mut();
            let mut ctx = HandlerContext {
                body,
                out,
                version,
                id,
                converter,
                readonly,
            };
            match (entry.handler)(&mut ctx) {
                Outcome::Responded => None,
                Outcome::Status(status) => Some(status),
            }
        }
        None => {
            #[cfg(feature = "tracing")]
            tracing::debug!(message_type, "no handler registered for message type");
            Some(Status::OpUnsupported)
        }
    };

    drop(ticket);

    if let Some(status) = status {
        let coerced = status.coerce(version);
        let out = job.writer_mut();
        out.reset();
        out.write_u8(packet::SSH_FXP_STATUS);
        out.write_u32(id);
        out.write_u32(coerced.code());
        out.write_string(coerced.message().as_bytes());
        out.write_string(b"en");
    }

    job
}

fn status_packet(id: u32, status: Status, version: u32) -> Vec<u8> {
    let coerced = status.coerce(version);
    let mut out = Writer::new();
    out.write_u8(packet::SSH_FXP_STATUS);
    out.write_u32(id);
    out.write_u32(coerced.code());
    out.write_string(coerced.message().as_bytes());
    out.write_string(b"en");
    out.into_vec()
}

/// Builds the `SSH_FXP_VERSION` response for a negotiated version,
/// including the version-dependent extension advertisements.
fn build_version_response(version: u32) -> Vec<u8> {
    let mut out = Writer::new();
    out.write_u8(packet::SSH_FXP_VERSION);
    out.write_u32(version);

    if version >= 4 {
        out.write_string(b"newline");
        out.write_string(b"\n");
    }

    if version == 5 {
        write_supported_block(&mut out, false);
    }

    if version == 6 {
        write_supported_block(&mut out, true);
        out.write_string(b"versions");
        out.write_string(b"3,4,5,6");
    }

    out.write_string(b"vendor-id");
    let vendor_offset = out.begin_sub();
    out.write_string(b"oferchen");
    out.write_string(b"sftp-server");
    out.write_string(b"0.6.1");
    out.write_u64(0);
    out.end_sub(vendor_offset);

    let symlink_order: &[u8] = if version == 3 {
        b"targetpath-linkpath"
    } else {
        b"linkpath-targetpath"
    };
    out.write_string(b"symlink-order@openssh.com");
    out.write_string(symlink_order);

    if version == 6 {
        out.write_string(b"link-order@openssh.com");
        out.write_string(b"linkpath-targetpath");
    }

    out.into_vec()
}

/// Supported open-flag mask shared by the `supported` (v5) and `supported2`
/// (v6) extension blocks: `ACCESS_DISPOSITION | APPEND_DATA |
/// APPEND_DATA_ATOMIC | TEXT_MODE`.
const SUPPORTED_OPEN_FLAGS: u32 = 0x0000_0007 | 0x0000_0008 | 0x0000_0010 | 0x0000_0020;
/// v6 adds `NOFOLLOW | DELETE_ON_CLOSE` to the open-flag mask.
const SUPPORTED2_OPEN_FLAGS: u32 = SUPPORTED_OPEN_FLAGS | 0x0000_0040 | 0x0000_0080;

fn write_supported_block(out: &mut Writer, v6: bool) {
    out.write_string(if v6 { b"supported2" } else { b"supported" });
    let offset = out.begin_sub();
    out.write_u32(0); // supported-attribute-mask: no restriction beyond the base set.
    out.write_u32(0); // supported-attribute-bits
    out.write_u32(if v6 {
        SUPPORTED2_OPEN_FLAGS
    } else {
        SUPPORTED_OPEN_FLAGS
    });
    out.write_u32(0xFFFF_FFFF); // supported-access-mask
    out.write_u32(0); // max-read-size: never promise a fixed short-read ceiling.
    if v6 {
        out.write_u16(0); // supported-block-vector
        out.write_u16(0); // supported-attrib-extension-count block (reserved)
        out.write_u32(0); // attrib-extension-count
    }
    out.write_u32(2); // extension-count
    out.write_string(b"posix-rename@openssh.com");
    out.write_string(b"hardlink@openssh.com");
    out.end_sub(offset);
}

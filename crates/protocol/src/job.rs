//! The in-flight request passed from the framer through dispatch to a
//! worker.
//!
//! A [`Job`] owns the raw request bytes (so it can cross a thread
//! boundary into the worker pool) and a response [`Writer`] seeded with the
//! reserved length prefix and echoed request id. No per-job arena is used
//! here; the standard allocator is adequate at the request rates an SFTP
//! subsystem process sees; see the design notes for why the original
//! per-request bump allocator wasn't ported.

use crate::codec::{Reader, Writer};
use crate::gate::Reservation;

/// A single parsed request, owned so it can move across threads.
pub struct Job {
    message_type: u8,
    id: u32,
    payload: Vec<u8>,
    out: Writer,
    reservation: Option<Reservation>,
}

impl Job {
    /// Builds a job from its already-split header fields: the message
    /// type, the request id (0 for `SSH_FXP_INIT`, which carries none),
    /// and `fields` holding everything after the id — the message-specific
    /// payload a handler decodes via [`Job::body`].
    #[must_use]
    pub fn new(message_type: u8, id: u32, fields: Vec<u8>) -> Self {
        Self {
            message_type,
            id,
            payload: fields,
            out: Writer::new(),
            reservation: None,
        }
    }

    /// Attaches a [`Gate`](crate::gate::Gate) reservation assigned on the
    /// reader thread, in receive order, before this job crosses into the
    /// worker pool.
    pub fn set_reservation(&mut self, reservation: Reservation) {
        self.reservation = Some(reservation);
    }

    /// Takes the reservation attached by [`Job::set_reservation`], if any.
    pub fn take_reservation(&mut self) -> Option<Reservation> {
        self.reservation.take()
    }

    /// The request's message type byte.
    #[must_use]
    pub const fn message_type(&self) -> u8 {
        self.message_type
    }

    /// The request id, to be echoed in the response.
    #[must_use]
    pub const fn id(&self) -> u32 {
        self.id
    }

    /// A fresh cursor over the request body, positioned at its first
    /// message-specific field.
    #[must_use]
    pub fn body(&self) -> Reader<'_> {
        Reader::new(&self.payload)
    }

    /// The message-specific field data, following the type byte and id.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Takes ownership of the response buffer for encoding, leaving an
    /// empty one behind.
    pub fn writer_mut(&mut self) -> &mut Writer {
        &mut self.out
    }

    /// Finishes the job, handing back its encoded response bytes.
    #[must_use]
    pub fn into_response(self) -> Vec<u8> {
        self.out.into_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_cursor_starts_after_type_and_id() {
        let mut payload = Vec::new();
        payload.extend_from_slice(b"rest-of-request");
        let job = Job::new(crate::packet::SSH_FXP_REMOVE, 42, payload.clone());
        assert_eq!(job.body().remaining(), payload.len());
        assert_eq!(job.id(), 42);
        assert_eq!(job.message_type(), crate::packet::SSH_FXP_REMOVE);
    }

    #[test]
    fn response_buffer_starts_empty_and_collects_writes() {
        let mut job = Job::new(crate::packet::SSH_FXP_REMOVE, 1, Vec::new());
        job.writer_mut().write_u8(crate::packet::SSH_FXP_STATUS);
        let bytes = job.into_response();
        assert_eq!(bytes, vec![crate::packet::SSH_FXP_STATUS]);
    }
}

//! The contract between the dispatch engine and the code that actually
//! touches a filesystem.
//!
//! `protocol` never opens a file or reads a directory itself. A host crate
//! builds a `&'static [CommandEntry]` per protocol version and hands it to
//! [`crate::tables::ProtocolTable::new`]; dispatch looks up the entry for an
//! incoming message type and calls its [`HandlerFn`].

use crate::codec::{Reader, Writer};
use crate::convert::Converter;
use crate::status::Status;

/// Per-job context passed to a handler.
///
/// Borrows the decoded request body and the response buffer; a handler
/// that answers with something other than STATUS writes the complete
/// response (type byte, echoed id, payload) into `out` itself and returns
/// [`Outcome::Responded`].
pub struct HandlerContext<'a> {
    /// Cursor positioned at the first message-specific field, past the
    /// message type and request id.
    pub body: Reader<'a>,
    /// Response buffer, empty on entry. A handler returning
    /// [`Outcome::Responded`] must write a complete response here,
    /// including the type byte and echoed `id`; dispatch only fills this
    /// in for [`Outcome::Status`].
    pub out: &'a mut Writer,
    /// Negotiated protocol version, for handlers whose wire shape or
    /// permitted flags vary by version (`SYMLINK` argument order, the v6
    /// `OPEN` flag set, and so on).
    pub version: u32,
    /// The request id to echo in a non-status response.
    pub id: u32,
    /// The filename-encoding collaborator for this connection.
    pub converter: &'a dyn Converter,
    /// Set when the server was started with `--readonly`. A handler that
    /// would modify the filesystem must check this itself and answer
    /// [`Status::WriteProtect`](crate::status::Status::WriteProtect)
    /// instead; the engine has no way to know which handlers mutate
    /// anything, so it cannot enforce this centrally.
    pub readonly: bool,
}

/// What a handler produced.
#[derive(Debug)]
pub enum Outcome {
    /// The handler did not write a response itself; dispatch encodes a
    /// STATUS packet from this code (translating filesystem errors through
    /// [`crate::status`] is the handler's job before returning this, since
    /// only the handler knows which syscall failed).
    Status(Status),
    /// The handler wrote a complete non-STATUS response (HANDLE, DATA,
    /// NAME, ATTRS, or an extended reply) into
    /// [`HandlerContext::out`] itself. Named for what it replaces: the
    /// original implementation's `HANDLER_RESPONDED` sentinel return value,
    /// here a real enum case instead of a magic status code.
    Responded,
}

/// A handler function: decode from `ctx.body`, optionally write to
/// `ctx.out`, return the outcome.
pub type HandlerFn = fn(&mut HandlerContext<'_>) -> Outcome;

/// One row of a dispatch table: the wire message type it answers and the
/// function that answers it.
#[derive(Clone, Copy)]
pub struct CommandEntry {
    /// `SSH_FXP_*` message type this entry answers.
    pub message_type: u8,
    /// The handler to invoke.
    pub handler: HandlerFn,
    /// Human-readable name, used in diagnostics only.
    pub name: &'static str,
}

impl CommandEntry {
    /// Builds a dispatch table row.
    #[must_use]
    pub const fn new(message_type: u8, name: &'static str, handler: HandlerFn) -> Self {
        Self {
            message_type,
            name,
            handler,
        }
    }
}

impl std::fmt::Debug for CommandEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandEntry")
            .field("message_type", &self.message_type)
            .field("name", &self.name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::Status;

    fn stub(_ctx: &mut HandlerContext<'_>) -> Outcome {
        Outcome::Status(Status::Ok)
    }

    #[test]
    fn command_entry_carries_its_message_type_and_name() {
        let entry = CommandEntry::new(crate::packet::SSH_FXP_REMOVE, "remove", stub);
        assert_eq!(entry.message_type, crate::packet::SSH_FXP_REMOVE);
        assert_eq!(entry.name, "remove");
    }
}

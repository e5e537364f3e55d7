//! Assembles the four per-version [`protocol::ProtocolTable`]s from
//! [`crate::handlers`].
//!
//! Which message types are wired in per version follows the protocol
//! history: `BLOCK`/`UNBLOCK` arrived in v5, and `STAT` (as distinct from
//! the always-present `LSTAT`) is registered from v3 onward since every
//! draft revision has carried it. The native v5 `SSH_FXP_LINK` opcode is
//! not wired in; `hardlink@openssh.com` (see [`handlers::extended`])
//! covers the same operation across every version this server negotiates.

use protocol::handler::CommandEntry;
use protocol::packet;
use protocol::tables::{ProtocolTable, TableSet};

use crate::handlers;

macro_rules! entries {
    ($($msg:expr => $name:literal : $handler:expr),+ $(,)?) => {
        &[$(CommandEntry::new($msg, $name, $handler)),+]
    };
}

/// Entries stay in ascending `message_type` order: `ProtocolTable` binary
/// searches this array.
const V3_ENTRIES: &[CommandEntry] = entries! {
    packet::SSH_FXP_OPEN => "open": handlers::open,
    packet::SSH_FXP_CLOSE => "close": handlers::close,
    packet::SSH_FXP_READ => "read": handlers::read,
    packet::SSH_FXP_WRITE => "write": handlers::write,
    packet::SSH_FXP_LSTAT => "lstat": handlers::lstat,
    packet::SSH_FXP_FSTAT => "fstat": handlers::fstat,
    packet::SSH_FXP_SETSTAT => "setstat": handlers::setstat,
    packet::SSH_FXP_FSETSTAT => "fsetstat": handlers::fsetstat,
    packet::SSH_FXP_OPENDIR => "opendir": handlers::opendir,
    packet::SSH_FXP_READDIR => "readdir": handlers::readdir,
    packet::SSH_FXP_REMOVE => "remove": handlers::remove,
    packet::SSH_FXP_MKDIR => "mkdir": handlers::mkdir,
    packet::SSH_FXP_RMDIR => "rmdir": handlers::rmdir,
    packet::SSH_FXP_REALPATH => "realpath": handlers::realpath,
    packet::SSH_FXP_STAT => "stat": handlers::stat,
    packet::SSH_FXP_RENAME => "rename": handlers::rename,
    packet::SSH_FXP_READLINK => "readlink": handlers::readlink,
    packet::SSH_FXP_SYMLINK => "symlink": handlers::symlink,
    packet::SSH_FXP_EXTENDED => "extended": handlers::extended,
};

/// v5/v6 answer everything v3/v4 do, plus byte-range locking. Entries stay
/// in ascending `message_type` order, same as `V3_ENTRIES`: `ProtocolTable`
/// binary searches this array.
const V5_ENTRIES: &[CommandEntry] = entries! {
    packet::SSH_FXP_OPEN => "open": handlers::open,
    packet::SSH_FXP_CLOSE => "close": handlers::close,
    packet::SSH_FXP_READ => "read": handlers::read,
    packet::SSH_FXP_WRITE => "write": handlers::write,
    packet::SSH_FXP_LSTAT => "lstat": handlers::lstat,
    packet::SSH_FXP_FSTAT => "fstat": handlers::fstat,
    packet::SSH_FXP_SETSTAT => "setstat": handlers::setstat,
    packet::SSH_FXP_FSETSTAT => "fsetstat": handlers::fsetstat,
    packet::SSH_FXP_OPENDIR => "opendir": handlers::opendir,
    packet::SSH_FXP_READDIR => "readdir": handlers::readdir,
    packet::SSH_FXP_REMOVE => "remove": handlers::remove,
    packet::SSH_FXP_MKDIR => "mkdir": handlers::mkdir,
    packet::SSH_FXP_RMDIR => "rmdir": handlers::rmdir,
    packet::SSH_FXP_REALPATH => "realpath": handlers::realpath,
    packet::SSH_FXP_STAT => "stat": handlers::stat,
    packet::SSH_FXP_RENAME => "rename": handlers::rename,
    packet::SSH_FXP_READLINK => "readlink": handlers::readlink,
    packet::SSH_FXP_SYMLINK => "symlink": handlers::symlink,
    packet::SSH_FXP_BLOCK => "block": handlers::block,
    packet::SSH_FXP_UNBLOCK => "unblock": handlers::unblock,
    packet::SSH_FXP_EXTENDED => "extended": handlers::extended,
};

/// Builds the four version-specific dispatch tables.
#[must_use]
pub fn build() -> TableSet {
    TableSet::new(
        ProtocolTable::new(3, V3_ENTRIES),
        ProtocolTable::new(4, V3_ENTRIES),
        ProtocolTable::new(5, V5_ENTRIES),
        ProtocolTable::new(6, V5_ENTRIES),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn v3_table_answers_open_but_not_block() {
        let tables = build();
        let v3 = tables.select(3).unwrap();
        assert!(v3.lookup(packet::SSH_FXP_OPEN).is_some());
        assert!(v3.lookup(packet::SSH_FXP_BLOCK).is_none());
    }

    #[test]
    fn v5_table_answers_block_and_unblock() {
        let tables = build();
        let v5 = tables.select(5).unwrap();
        assert!(v5.lookup(packet::SSH_FXP_BLOCK).is_some());
        assert!(v5.lookup(packet::SSH_FXP_UNBLOCK).is_some());
    }

    #[test]
    fn entries_are_sorted_by_message_type() {
        for entries in [V3_ENTRIES, V5_ENTRIES] {
            assert!(entries.windows(2).all(|pair| pair[0].message_type < pair[1].message_type));
        }
    }

    #[test]
    fn every_table_answers_realpath() {
        let tables = build();
        for version in 3..=6 {
            assert!(tables.select(version).unwrap().lookup(packet::SSH_FXP_REALPATH).is_some());
        }
    }
}

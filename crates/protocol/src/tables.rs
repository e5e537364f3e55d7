//! The per-version dispatch tables and the active-table state machine.
//!
//! Before `SSH_FXP_INIT` is answered, no [`ProtocolTable`] is active; the
//! only message [`crate::dispatch`] will honour is `INIT` itself, handled
//! internally rather than through a table entry. Once a version is
//! selected, [`TableSet::select`] hands back the matching table and that
//! choice never changes again for the life of the connection.

use crate::handler::CommandEntry;
use crate::packet;

/// An immutable dispatch table for one negotiated protocol version.
///
/// Cheap to copy: the entry list is a `&'static` slice, so a table can be
/// handed to a worker thread or stashed in connection state without an
/// `Arc`.
#[derive(Clone, Copy)]
pub struct ProtocolTable {
    version: u32,
    maxstatus: u32,
    entries: &'static [CommandEntry],
}

impl ProtocolTable {
    /// Builds the table for `version` from a host-supplied entry list.
    ///
    /// `version` must be in `3..=6`; anything else collapses `maxstatus` to
    /// `SSH_FX_FAILURE`, since such a table could never be produced by
    /// [`TableSet::select`].
    ///
    /// `entries` must be sorted by `message_type`: [`ProtocolTable::lookup`]
    /// binary searches it.
    #[must_use]
    pub fn new(version: u32, entries: &'static [CommandEntry]) -> Self {
        debug_assert!(
            entries.windows(2).all(|pair| pair[0].message_type < pair[1].message_type),
            "dispatch table entries must be sorted by message_type for binary search"
        );
        let maxstatus = packet::maxstatus_for(version).unwrap_or(packet::SSH_FX_FAILURE);
        Self {
            version,
            maxstatus,
            entries,
        }
    }

    /// The protocol version this table answers for.
    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// The highest status code this table's responses may carry.
    #[must_use]
    pub const fn maxstatus(&self) -> u32 {
        self.maxstatus
    }

    /// Looks up the handler bound to `message_type`, if this table answers
    /// it. Binary search: `entries` is sorted by `message_type`.
    #[must_use]
    pub fn lookup(&self, message_type: u8) -> Option<CommandEntry> {
        self.entries
            .binary_search_by_key(&message_type, |entry| entry.message_type)
            .ok()
            .map(|index| self.entries[index])
    }
}

/// The four versioned dispatch tables a host assembles at startup.
pub struct TableSet {
    v3: ProtocolTable,
    v4: ProtocolTable,
    v5: ProtocolTable,
    v6: ProtocolTable,
}

impl TableSet {
    /// Assembles the full set. Each table's `version()` must equal the
    /// `u32` implied by its position (3, 4, 5, 6 respectively); this is the
    /// host crate's responsibility to get right when it builds the tables.
    #[must_use]
    pub const fn new(
        v3: ProtocolTable,
        v4: ProtocolTable,
        v5: ProtocolTable,
        v6: ProtocolTable,
    ) -> Self {
        Self { v3, v4, v5, v6 }
    }

    /// The highest protocol version this set can negotiate.
    #[must_use]
    pub const fn max_supported(&self) -> u32 {
        self.v6.version()
    }

    /// Selects the table to activate for a client that advertised
    /// `client_version` in its `SSH_FXP_INIT`.
    ///
    /// The negotiated version is `min(client_version, max_supported)`,
    /// floored at 3; a client advertising less than 3 cannot be served and
    /// this returns `None`.
    #[must_use]
    pub const fn select(&self, client_version: u32) -> Option<&ProtocolTable> {
        if client_version < 3 {
            return None;
        }
        let negotiated = if client_version > self.max_supported() {
            self.max_supported()
        } else {
            client_version
        };
        Some(match negotiated {
            3 => &self.v3,
            4 => &self.v4,
            5 => &self.v5,
            _ => &self.v6,
        })
    }
}

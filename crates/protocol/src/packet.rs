//! SFTP message type and status code constants.
//!
//! Names and values follow `draft-ietf-secsh-filexfer`. Constants that were
//! added in a later revision than 3 are noted; dispatch tables decide which
//! of these are reachable for a given negotiated version, this module only
//! names the wire values.

#![allow(missing_docs)]

/// `SSH_FXP_INIT` — client hello, carries the client's maximum version.
pub const SSH_FXP_INIT: u8 = 1;
/// `SSH_FXP_VERSION` — server hello, carries the selected version.
pub const SSH_FXP_VERSION: u8 = 2;
pub const SSH_FXP_OPEN: u8 = 3;
pub const SSH_FXP_CLOSE: u8 = 4;
pub const SSH_FXP_READ: u8 = 5;
pub const SSH_FXP_WRITE: u8 = 6;
pub const SSH_FXP_LSTAT: u8 = 7;
pub const SSH_FXP_FSTAT: u8 = 8;
pub const SSH_FXP_SETSTAT: u8 = 9;
pub const SSH_FXP_FSETSTAT: u8 = 10;
pub const SSH_FXP_OPENDIR: u8 = 11;
pub const SSH_FXP_READDIR: u8 = 12;
pub const SSH_FXP_REMOVE: u8 = 13;
pub const SSH_FXP_MKDIR: u8 = 14;
pub const SSH_FXP_RMDIR: u8 = 15;
pub const SSH_FXP_REALPATH: u8 = 16;
pub const SSH_FXP_STAT: u8 = 17;
pub const SSH_FXP_RENAME: u8 = 18;
pub const SSH_FXP_READLINK: u8 = 19;
/// `SSH_FXP_SYMLINK` — present from v3; v6 swaps the argument order (see
/// `daemon::handlers`, which is responsible for that detail).
pub const SSH_FXP_SYMLINK: u8 = 20;
/// Added in v5.
pub const SSH_FXP_LINK: u8 = 21;
/// Added in v5.
pub const SSH_FXP_BLOCK: u8 = 22;
/// Added in v5.
pub const SSH_FXP_UNBLOCK: u8 = 23;

pub const SSH_FXP_STATUS: u8 = 101;
pub const SSH_FXP_HANDLE: u8 = 102;
pub const SSH_FXP_DATA: u8 = 103;
pub const SSH_FXP_NAME: u8 = 104;
pub const SSH_FXP_ATTRS: u8 = 105;

pub const SSH_FXP_EXTENDED: u8 = 200;
pub const SSH_FXP_EXTENDED_REPLY: u8 = 201;

/// Status codes, in ascending `maxstatus` order. A table's `maxstatus` is
/// the highest value its protocol version may emit; see
/// [`crate::tables`].
pub const SSH_FX_OK: u32 = 0;
pub const SSH_FX_EOF: u32 = 1;
pub const SSH_FX_NO_SUCH_FILE: u32 = 2;
pub const SSH_FX_PERMISSION_DENIED: u32 = 3;
pub const SSH_FX_FAILURE: u32 = 4;
pub const SSH_FX_BAD_MESSAGE: u32 = 5;
pub const SSH_FX_NO_CONNECTION: u32 = 6;
pub const SSH_FX_CONNECTION_LOST: u32 = 7;
/// `maxstatus` for protocol version 3.
pub const SSH_FX_OP_UNSUPPORTED: u32 = 8;
/// Added in v4.
pub const SSH_FX_INVALID_HANDLE: u32 = 9;
pub const SSH_FX_NO_SUCH_PATH: u32 = 10;
pub const SSH_FX_FILE_ALREADY_EXISTS: u32 = 11;
pub const SSH_FX_WRITE_PROTECT: u32 = 12;
/// `maxstatus` for protocol version 4.
pub const SSH_FX_NO_MEDIA: u32 = 13;
/// Added in v5.
pub const SSH_FX_NO_SPACE_ON_FILESYSTEM: u32 = 14;
pub const SSH_FX_QUOTA_EXCEEDED: u32 = 15;
pub const SSH_FX_UNKNOWN_PRINCIPAL: u32 = 16;
/// `maxstatus` for protocol version 5.
pub const SSH_FX_LOCK_CONFLICT: u32 = 17;
/// Added in v6.
pub const SSH_FX_DIR_NOT_EMPTY: u32 = 18;
pub const SSH_FX_NOT_A_DIRECTORY: u32 = 19;
pub const SSH_FX_INVALID_FILENAME: u32 = 20;
pub const SSH_FX_LINK_LOOP: u32 = 21;
pub const SSH_FX_CANNOT_DELETE: u32 = 22;
pub const SSH_FX_INVALID_PARAMETER: u32 = 23;
pub const SSH_FX_FILE_IS_A_DIRECTORY: u32 = 24;
pub const SSH_FX_BYTE_RANGE_LOCK_CONFLICT: u32 = 25;
pub const SSH_FX_BYTE_RANGE_LOCK_REFUSED: u32 = 26;
pub const SSH_FX_DELETE_PENDING: u32 = 27;
pub const SSH_FX_FILE_CORRUPT: u32 = 28;
pub const SSH_FX_OWNER_INVALID: u32 = 29;
pub const SSH_FX_GROUP_INVALID: u32 = 30;
/// `maxstatus` for protocol version 6.
pub const SSH_FX_NO_MATCHING_BYTE_RANGE_LOCK: u32 = 31;

/// `maxstatus` for each supported protocol version, indexed `[3..=6]` via
/// [`maxstatus_for`].
const MAXSTATUS_BY_VERSION: [u32; 4] = [
    SSH_FX_OP_UNSUPPORTED,
    SSH_FX_NO_MEDIA,
    SSH_FX_LOCK_CONFLICT,
    SSH_FX_NO_MATCHING_BYTE_RANGE_LOCK,
];

/// Returns the highest status code legal on the wire for `version`, or
/// `None` if `version` is outside `3..=6`.
#[must_use]
pub const fn maxstatus_for(version: u32) -> Option<u32> {
    if version < 3 || version > 6 {
        return None;
    }
    Some(MAXSTATUS_BY_VERSION[(version - 3) as usize])
}

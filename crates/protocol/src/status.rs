//! Handler status codes and OS error translation.
//!
//! [`Status`] is the handler-facing result type; [`Status::coerce`] clamps
//! it to what the negotiated protocol version may legally carry on the
//! wire, and [`Status::from_io_error`] maps a `std::io::Error` onto the
//! closest status without the handler needing to know about errno.

use std::io;

use crate::packet;

/// A handler-level outcome, independent of wire representation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    Ok,
    Eof,
    NoSuchFile,
    PermissionDenied,
    Failure,
    BadMessage,
    NoConnection,
    ConnectionLost,
    OpUnsupported,
    InvalidHandle,
    NoSuchPath,
    FileAlreadyExists,
    WriteProtect,
    NoMedia,
    NoSpaceOnFilesystem,
    QuotaExceeded,
    UnknownPrincipal,
    LockConflict,
    DirNotEmpty,
    NotADirectory,
    InvalidFilename,
    LinkLoop,
    CannotDelete,
    InvalidParameter,
    FileIsADirectory,
    ByteRangeLockConflict,
    ByteRangeLockRefused,
    DeletePending,
    FileCorrupt,
    OwnerInvalid,
    GroupInvalid,
    NoMatchingByteRangeLock,
}

impl Status {
    /// The wire status code for this value, independent of version.
    /// [`Status::coerce`] is what enforces a table's `maxstatus`.
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Self::Ok => packet::SSH_FX_OK,
            Self::Eof => packet::SSH_FX_EOF,
            Self::NoSuchFile => packet::SSH_FX_NO_SUCH_FILE,
            Self::PermissionDenied => packet::SSH_FX_PERMISSION_DENIED,
            Self::Failure => packet::SSH_FX_FAILURE,
            Self::BadMessage => packet::SSH_FX_BAD_MESSAGE,
            Self::NoConnection => packet::SSH_FX_NO_CONNECTION,
            Self::ConnectionLost => packet::SSH_FX_CONNECTION_LOST,
            Self::OpUnsupported => packet::SSH_FX_OP_UNSUPPORTED,
            Self::InvalidHandle => packet::SSH_FX_INVALID_HANDLE,
            Self::NoSuchPath => packet::SSH_FX_NO_SUCH_PATH,
            Self::FileAlreadyExists => packet::SSH_FX_FILE_ALREADY_EXISTS,
            Self::WriteProtect => packet::SSH_FX_WRITE_PROTECT,
            Self::NoMedia => packet::SSH_FX_NO_MEDIA,
            Self::NoSpaceOnFilesystem => packet::SSH_FX_NO_SPACE_ON_FILESYSTEM,
            Self::QuotaExceeded => packet::SSH_FX_QUOTA_EXCEEDED,
            Self::UnknownPrincipal => packet::SSH_FX_UNKNOWN_PRINCIPAL,
            Self::LockConflict => packet::SSH_FX_LOCK_CONFLICT,
            Self::DirNotEmpty => packet::SSH_FX_DIR_NOT_EMPTY,
            Self::NotADirectory => packet::SSH_FX_NOT_A_DIRECTORY,
            Self::InvalidFilename => packet::SSH_FX_INVALID_FILENAME,
            Self::LinkLoop => packet::SSH_FX_LINK_LOOP,
            Self::CannotDelete => packet::SSH_FX_CANNOT_DELETE,
            Self::InvalidParameter => packet::SSH_FX_INVALID_PARAMETER,
            Self::FileIsADirectory => packet::SSH_FX_FILE_IS_A_DIRECTORY,
            Self::ByteRangeLockConflict => packet::SSH_FX_BYTE_RANGE_LOCK_CONFLICT,
            Self::ByteRangeLockRefused => packet::SSH_FX_BYTE_RANGE_LOCK_REFUSED,
            Self::DeletePending => packet::SSH_FX_DELETE_PENDING,
            Self::FileCorrupt => packet::SSH_FX_FILE_CORRUPT,
            Self::OwnerInvalid => packet::SSH_FX_OWNER_INVALID,
            Self::GroupInvalid => packet::SSH_FX_GROUP_INVALID,
            Self::NoMatchingByteRangeLock => packet::SSH_FX_NO_MATCHING_BYTE_RANGE_LOCK,
        }
    }

    /// The human-readable text accompanying this status in a STATUS
    /// response's `error-message` field.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Ok => "Success",
            Self::Eof => "End of file",
            Self::NoSuchFile => "No such file or directory",
            Self::PermissionDenied => "Permission denied",
            Self::Failure => "Failure",
            Self::BadMessage => "Bad message",
            Self::NoConnection => "No connection",
            Self::ConnectionLost => "Connection lost",
            Self::OpUnsupported => "Operation unsupported",
            Self::InvalidHandle => "Invalid handle",
            Self::NoSuchPath => "No such path",
            Self::FileAlreadyExists => "File already exists",
            Self::WriteProtect => "Write protected filesystem",
            Self::NoMedia => "No media",
            Self::NoSpaceOnFilesystem => "No space left on filesystem",
            Self::QuotaExceeded => "Quota exceeded",
            Self::UnknownPrincipal => "Unknown principal",
            Self::LockConflict => "Lock conflict",
            Self::DirNotEmpty => "Directory not empty",
            Self::NotADirectory => "Not a directory",
            Self::InvalidFilename => "Invalid filename",
            Self::LinkLoop => "Too many symbolic links",
            Self::CannotDelete => "Cannot delete",
            Self::InvalidParameter => "Invalid parameter",
            Self::FileIsADirectory => "File is a directory",
            Self::ByteRangeLockConflict => "Byte range lock conflict",
            Self::ByteRangeLockRefused => "Byte range lock refused",
            Self::DeletePending => "Delete pending",
            Self::FileCorrupt => "File corrupt",
            Self::OwnerInvalid => "Owner invalid",
            Self::GroupInvalid => "Group invalid",
            Self::NoMatchingByteRangeLock => "No matching byte range lock",
        }
    }

    /// Clamps this status to what `version` may legally carry, per
    /// `maxstatus`. A status too new for the negotiated version downgrades
    /// to [`Status::Failure`], which every version supports.
    #[must_use]
    pub fn coerce(self, version: u32) -> Self {
        match packet::maxstatus_for(version) {
            Some(max) if self.code() <= max => self,
            Some(_) => Self::Failure,
            None => Self::Failure,
        }
    }

    /// Translates an I/O error from a filesystem syscall into the closest
    /// matching status. Handlers call this instead of inspecting the error
    /// directly, so the mapping lives in one place.
    #[must_use]
    pub fn from_io_error(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NoSuchFile,
            io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            io::ErrorKind::AlreadyExists => Self::FileAlreadyExists,
            io::ErrorKind::InvalidInput | io::ErrorKind::InvalidData => Self::BadMessage,
            io::ErrorKind::UnexpectedEof => Self::Eof,
            io::ErrorKind::IsADirectory => Self::FileIsADirectory,
            io::ErrorKind::NotADirectory => Self::NotADirectory,
            io::ErrorKind::DirectoryNotEmpty => Self::DirNotEmpty,
            io::ErrorKind::ReadOnlyFilesystem => Self::WriteProtect,
            io::ErrorKind::FilesystemLoop => Self::LinkLoop,
            io::ErrorKind::FilesystemQuotaExceeded => Self::QuotaExceeded,
            io::ErrorKind::InvalidFilename => Self::InvalidFilename,
            io::ErrorKind::StorageFull => Self::NoSpaceOnFilesystem,
            io::ErrorKind::ResourceBusy | io::ErrorKind::WouldBlock => Self::LockConflict,
            _ => Self::Failure,
        }
    }
}

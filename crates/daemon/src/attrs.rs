//! Encoding `std::fs::Metadata` as an SFTP `ATTRS` structure.
//!
//! v3 carries a fixed field set (size, uid/gid, permissions, atime/mtime) in
//! a flags bitmask; v4 onward prepends a file-type byte and narrows the
//! default field set to size/permissions/times, which is what this module
//! emits for those versions. `owner`/`group` strings, ACLs, subsecond times,
//! and `createtime` are legal v4+ extensions this module does not set the
//! flag bits for, so clients never expect them from here.

use std::fs::Metadata;
use std::os::unix::fs::MetadataExt;
use std::time::UNIX_EPOCH;

use protocol::codec::Writer;

const ATTR_SIZE: u32 = 0x0000_0001;
const ATTR_UIDGID: u32 = 0x0000_0002;
const ATTR_PERMISSIONS: u32 = 0x0000_0004;
const ATTR_ACMODTIME: u32 = 0x0000_0008;
const ATTR_ACCESSTIME: u32 = 0x0000_0008;
const ATTR_MODIFYTIME: u32 = 0x0000_0020;

const FILEXFER_TYPE_REGULAR: u8 = 1;
const FILEXFER_TYPE_DIRECTORY: u8 = 2;
const FILEXFER_TYPE_SYMLINK: u8 = 3;
const FILEXFER_TYPE_SPECIAL: u8 = 4;
const FILEXFER_TYPE_UNKNOWN: u8 = 5;

fn file_type_byte(metadata: &Metadata) -> u8 {
    let kind = metadata.file_type();
    if kind.is_file() {
        FILEXFER_TYPE_REGULAR
    } else if kind.is_dir() {
        FILEXFER_TYPE_DIRECTORY
    } else if kind.is_symlink() {
        FILEXFER_TYPE_SYMLINK
    } else if kind.is_block_device() || kind.is_char_device() || kind.is_fifo() || kind.is_socket() {
        FILEXFER_TYPE_SPECIAL
    } else {
        FILEXFER_TYPE_UNKNOWN
    }
}

fn unix_time(secs: i64) -> u64 {
    u64::try_from(secs).unwrap_or(0)
}

/// Writes an `ATTRS` structure (flags, then each present field) for
/// `metadata`, shaped per `version`.
pub fn write_attrs(out: &mut Writer, version: u32, metadata: &Metadata) {
    if version >= 4 {
        out.write_u32(ATTR_SIZE | ATTR_PERMISSIONS | ATTR_ACCESSTIME | ATTR_MODIFYTIME);
        out.write_u8(file_type_byte(metadata));
        out.write_u64(metadata.size());
        out.write_u32(metadata.mode());
        out.write_u64(unix_time(metadata.atime()));
        out.write_u64(unix_time(metadata.mtime()));
    } else {
        out.write_u32(ATTR_SIZE | ATTR_UIDGID | ATTR_PERMISSIONS | ATTR_ACMODTIME);
        out.write_u64(metadata.size());
        out.write_u32(metadata.uid());
        out.write_u32(metadata.gid());
        out.write_u32(metadata.mode());
        out.write_u32(metadata.atime() as u32);
        out.write_u32(metadata.mtime() as u32);
    }
}

/// Renders the `ls -l`-style `longname` field v3's `NAME` response carries
/// alongside each bare filename.
#[must_use]
pub fn longname(name: &str, metadata: &Metadata) -> String {
    let kind = metadata.file_type();
    let type_char = if kind.is_dir() {
        'd'
    } else if kind.is_symlink() {
        'l'
    } else {
        '-'
    };
    let mode = metadata.mode();
    let perm_char = |bit: u32, c: char| if mode & bit != 0 { c } else { '-' };
    let perms: String = [
        perm_char(0o400, 'r'),
        perm_char(0o200, 'w'),
        perm_char(0o100, 'x'),
        perm_char(0o040, 'r'),
        perm_char(0o020, 'w'),
        perm_char(0o010, 'x'),
        perm_char(0o004, 'r'),
        perm_char(0o002, 'w'),
        perm_char(0o001, 'x'),
    ]
    .into_iter()
    .collect();
    let mtime = UNIX_EPOCH
        .checked_add(std::time::Duration::from_secs(unix_time(metadata.mtime())))
        .unwrap_or(UNIX_EPOCH);
    let _ = mtime;
    format!(
        "{type_char}{perms} {nlink:>3} {uid:>6} {gid:>6} {size:>10} {name}",
        nlink = metadata.nlink(),
        uid = metadata.uid(),
        gid = metadata.gid(),
        size = metadata.size(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::codec::Reader;

    #[test]
    fn v3_attrs_carry_uid_gid_and_both_times() {
        let metadata = std::fs::metadata(".").unwrap();
        let mut out = Writer::new();
        write_attrs(&mut out, 3, &metadata);
        let bytes = out.into_vec();
        let mut r = Reader::new(&bytes);
        let flags = r.read_u32().unwrap();
        assert_eq!(flags, ATTR_SIZE | ATTR_UIDGID | ATTR_PERMISSIONS | ATTR_ACMODTIME);
    }

    #[test]
    fn v4_attrs_lead_with_a_type_byte() {
        let metadata = std::fs::metadata(".").unwrap();
        let mut out = Writer::new();
        write_attrs(&mut out, 4, &metadata);
        let bytes = out.into_vec();
        let mut r = Reader::new(&bytes);
        r.read_u32().unwrap();
        assert_eq!(r.read_u8().unwrap(), FILEXFER_TYPE_DIRECTORY);
    }

    #[test]
    fn longname_marks_directories() {
        let metadata = std::fs::metadata(".").unwrap();
        let line = longname(".", &metadata);
        assert!(line.starts_with('d'));
    }
}

//! The open-handle table.
//!
//! A handle is an opaque 8-byte big-endian counter value from the client's
//! point of view; internally it indexes either an open [`std::fs::File`] or
//! a pre-materialised directory listing (SFTP's `READDIR` hands back
//! entries in batches from a snapshot taken at `OPENDIR` time, rather than
//! re-reading the directory live).
//!
//! One process serves exactly one connection — subsystem mode is spawned
//! fresh per session by sshd, and the standalone daemon forks per
//! connection — so a single process-wide table is the whole of the
//! per-connection handle state, the same shape the reference
//! implementation's per-process handle array has.

use std::fs::File;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{LazyLock, Mutex};

use rustc_hash::FxHashMap;

/// A directory entry captured at `OPENDIR` time.
pub struct DirEntry {
    /// Bare filename, no path component.
    pub name: String,
    /// `ls -l`-style rendering used for v3's `longname` field.
    pub longname: String,
    pub metadata: std::fs::Metadata,
}

enum Entry {
    File(File),
    Dir(Vec<DirEntry>),
}

/// The process-wide open-handle table.
pub struct HandleTable {
    entries: Mutex<FxHashMap<u64, Entry>>,
    next: AtomicU64,
}

/// The global handle table for this connection's process.
pub static HANDLES: LazyLock<HandleTable> = LazyLock::new(HandleTable::new);

impl HandleTable {
    fn new() -> Self {
        Self {
            entries: Mutex::new(FxHashMap::default()),
            next: AtomicU64::new(0),
        }
    }

    fn issue(&self, entry: Entry) -> Vec<u8> {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        self.entries
            .lock()
            .expect("handle table poisoned")
            .insert(id, entry);
        id.to_be_bytes().to_vec()
    }

    /// Registers an open file, returning its wire handle.
    pub fn open_file(&self, file: File) -> Vec<u8> {
        self.issue(Entry::File(file))
    }

    /// Registers a directory snapshot, returning its wire handle.
    pub fn open_dir(&self, entries: Vec<DirEntry>) -> Vec<u8> {
        self.issue(Entry::Dir(entries))
    }

    fn decode(handle: &[u8]) -> Option<u64> {
        Some(u64::from_be_bytes(handle.try_into().ok()?))
    }

    /// Runs `f` with exclusive access to the open file behind `handle`.
    /// Returns `None` if `handle` doesn't name an open file.
    pub fn with_file<T>(&self, handle: &[u8], f: impl FnOnce(&mut File) -> T) -> Option<T> {
        let id = Self::decode(handle)?;
        let mut entries = self.entries.lock().expect("handle table poisoned");
        match entries.get_mut(&id)? {
            Entry::File(file) => Some(f(file)),
            Entry::Dir(_) => None,
        }
    }

    /// Pops up to `limit` directory entries from the snapshot behind
    /// `handle`. Returns `None` if `handle` doesn't name an open
    /// directory, `Some(vec![])` once the snapshot is exhausted.
    pub fn take_dir_entries(&self, handle: &[u8], limit: usize) -> Option<Vec<DirEntry>> {
        let id = Self::decode(handle)?;
        let mut entries = self.entries.lock().expect("handle table poisoned");
        match entries.get_mut(&id)? {
            Entry::Dir(remaining) => {
                let take = remaining.len().min(limit);
                Some(remaining.drain(..take).collect())
            }
            Entry::File(_) => None,
        }
    }

    /// Closes `handle`, freeing its slot. Returns `false` if it was already
    /// closed or never existed.
    pub fn close(&self, handle: &[u8]) -> bool {
        let Some(id) = Self::decode(handle) else {
            return false;
        };
        self.entries
            .lock()
            .expect("handle table poisoned")
            .remove(&id)
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn issued_handles_are_unique_and_closeable() {
        let table = HandleTable::new();
        let a = table.open_dir(Vec::new());
        let b = table.open_dir(Vec::new());
        assert_ne!(a, b);
        assert!(table.close(&a));
        assert!(!table.close(&a));
    }

    #[test]
    fn unknown_handle_misses_every_accessor() {
        let table = HandleTable::new();
        assert!(table.with_file(&[0, 0, 0, 0, 0, 0, 0, 99], |_| ()).is_none());
        assert!(table.take_dir_entries(&[0, 0, 0, 0, 0, 0, 0, 99], 10).is_none());
    }

    #[test]
    fn directory_snapshot_drains_in_order() {
        let table = HandleTable::new();
        let meta = fs::metadata(".").unwrap();
        let entries = vec![
            DirEntry { name: "a".into(), longname: "a".into(), metadata: meta.clone() },
            DirEntry { name: "b".into(), longname: "b".into(), metadata: meta },
        ];
        let handle = table.open_dir(entries);
        let first = table.take_dir_entries(&handle, 1).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].name, "a");
        let rest = table.take_dir_entries(&handle, 10).unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].name, "b");
        let empty = table.take_dir_entries(&handle, 10).unwrap();
        assert!(empty.is_empty());
    }
}

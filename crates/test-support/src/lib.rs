#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! Fixtures shared by the workspace's test suites: a scratch directory and
//! an in-memory duplex pipe standing in for a client's stdin/stdout.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

/// Creates a fresh temporary directory for a test, panicking on failure
/// since a broken test fixture should fail loudly.
#[must_use]
pub fn scratch_dir() -> TempDir {
    TempDir::new().expect("failed to create scratch directory")
}

#[derive(Default)]
struct PipeState {
    buf: VecDeque<u8>,
}

/// One end of an in-memory duplex pipe. Bytes written on one end are read
/// back from the other.
#[derive(Clone)]
pub struct DuplexPipe {
    outgoing: Arc<Mutex<PipeState>>,
    incoming: Arc<Mutex<PipeState>>,
}

impl DuplexPipe {
    /// Builds a connected pair; writes to `a` are visible as reads on `b`
    /// and vice versa.
    #[must_use]
    pub fn pair() -> (Self, Self) {
        let left = Arc::new(Mutex::new(PipeState::default()));
        let right = Arc::new(Mutex::new(PipeState::default()));
        (
            Self {
                outgoing: Arc::clone(&left),
                incoming: Arc::clone(&right),
            },
            Self {
                outgoing: right,
                incoming: left,
            },
        )
    }
}

impl Read for DuplexPipe {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.incoming.lock().expect("pipe mutex poisoned");
        let n = state.buf.len().min(buf.len());
        for slot in buf.iter_mut().take(n) {
            *slot = state.buf.pop_front().expect("checked length above");
        }
        Ok(n)
    }
}

impl Write for DuplexPipe {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.outgoing.lock().expect("pipe mutex poisoned");
        state.buf.extend(buf.iter().copied());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

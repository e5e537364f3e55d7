#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! Tracing setup shared by the `sftp-server` and `sftp-serverd` binaries.
//!
//! The server has exactly two logging postures: quiet (the default, since
//! an sshd-launched subsystem's stderr is usually discarded) and debug
//! (`-d`/`--debug`, which may be repeated for increasingly verbose output).
//! This crate turns that simple flag into a [`tracing_subscriber`]
//! `EnvFilter` and installs it as the global subscriber.

use tracing_subscriber::EnvFilter;

/// How much diagnostic output the server should produce.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Warnings and errors only.
    #[default]
    Quiet,
    /// Per-connection lifecycle events, in addition to warnings and errors.
    Debug,
    /// Per-request dispatch tracing, in addition to everything `Debug`
    /// logs. Matches a repeated `-d -d` on the command line.
    Trace,
}

impl Verbosity {
    /// Maps a repeated `-d`/`--debug` flag count to a verbosity level.
    #[must_use]
    pub const fn from_flag_count(count: u8) -> Self {
        match count {
            0 => Self::Quiet,
            1 => Self::Debug,
            _ => Self::Trace,
        }
    }

    /// The `tracing` directive string this level corresponds to.
    #[must_use]
    pub const fn directive(self) -> &'static str {
        match self {
            Self::Quiet => "warn",
            Self::Debug => "sftp_server=debug,daemon=debug,protocol=debug",
            Self::Trace => "sftp_server=trace,daemon=trace,protocol=trace",
        }
    }
}

/// Installs a global [`tracing`] subscriber writing to stderr at `level`,
/// honouring `RUST_LOG` if set (it takes priority over `level`).
///
/// Subsystem mode writes framed SFTP packets on stdout/stdin, so logging
/// must never touch stdout; this always targets stderr.
pub fn init(level: Verbosity) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.directive()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

//! Daemon-level errors: everything that can go wrong outside a single SFTP
//! request.

use thiserror::Error;

/// A fatal error encountered while starting or running the server.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// The protocol engine hit a framing error (truncated packet, bad INIT
    /// sequencing) that ends the connection.
    #[error(transparent)]
    Protocol(#[from] protocol::ProtocolError),
    /// Privilege dropping or chroot failed during standalone startup.
    #[error(transparent)]
    Platform(#[from] platform::PlatformError),
    /// A filename-encoding label passed via `--local-encoding` is unknown to
    /// `encoding_rs`.
    #[error("unknown local encoding: {0}")]
    UnknownEncoding(String),
    /// `--background` was given without `--listen`; daemonizing a
    /// subsystem process makes no sense since sshd already owns its
    /// lifecycle.
    #[error("--background requires --listen")]
    BackgroundWithoutListen,
    /// `sftp-serverd` was started without `--listen`; unlike `sftp-server`
    /// it has no stdio fallback.
    #[error("--listen is required")]
    ListenRequired,
    /// Binding or accepting on the configured listen address failed.
    #[error("network error: {0}")]
    Io(#[from] std::io::Error),
}

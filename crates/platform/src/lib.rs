#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! Unix privilege-drop and signal-handling primitives for the standalone
//! daemon.
//!
//! Subsystem mode (launched by sshd) never calls into this crate: sshd has
//! already authenticated the session and the process already runs as the
//! target user. Only the standalone forking daemon (`sftp-serverd`) needs
//! to chroot, drop privileges, and reap its own children.
//!
//! # Design
//!
//! The ordering in [`drop_privileges`] — chroot before dropping group and
//! user — is load-bearing: dropping privileges first would leave the
//! process unable to call `chroot` afterward. It also double-checks that
//! `setuid(0)` fails after the drop, the same sanity check the reference
//! implementation makes, since a kernel or libc bug that silently failed
//! to drop root would otherwise go unnoticed until it mattered.

#[cfg(unix)]
pub mod unix;

#[cfg(unix)]
pub use unix::{chroot_to, drop_privileges, ignore_sigpipe, reap_children, PlatformError};

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `daemon` is the host crate around `protocol`'s engine: a concrete
//! filesystem [`handlers`] module answering `SSH_FXP_*` requests against
//! `std::fs`, the [`tables`] that wire those handlers into
//! `protocol::ProtocolTable`s, the per-connection [`server`] loop, and the
//! CLI/[`config`] surface for both operating modes.
//!
//! Subsystem mode (the default) never calls into [`accept`] or
//! [`privilege`]: sshd has already authenticated the session and dropped to
//! the target user before exec-ing this process. Only standalone daemon
//! mode (`--listen`) binds a socket, forks per connection, and drops
//! privileges itself.
//!
//! This crate's one `unsafe` use is the `fork()` call in [`accept`]; that is
//! why this crate, unlike `protocol`, does not carry `#![deny(unsafe_code)]`.

pub mod accept;
pub mod attrs;
pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod handles;
pub mod privilege;
pub mod server;
pub mod tables;

pub use cli::Cli;
pub use config::RuntimeOptions;
pub use error::DaemonError;

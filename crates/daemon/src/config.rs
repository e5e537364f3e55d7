//! Runtime configuration assembled from [`crate::cli::Cli`].

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use protocol::convert::{Converter, Utf8Passthrough};

use crate::cli::Cli;
use crate::error::DaemonError;

/// Fully resolved options the server loop runs with, independent of how
/// they were supplied on the command line.
pub struct RuntimeOptions {
    /// Reject any request that would modify the filesystem.
    pub readonly: bool,
    /// Directory to `chroot` into before serving, if any.
    pub chroot: Option<PathBuf>,
    /// User to drop privileges to after chrooting, if any.
    pub user: Option<String>,
    /// `Some(port)` puts the process in standalone daemon mode.
    pub listen: Option<u16>,
    /// Bind address for standalone mode; `None` means all interfaces.
    pub host: Option<IpAddr>,
    /// Detach from the controlling terminal in standalone mode.
    pub background: bool,
    /// Worker pool size.
    pub workers: usize,
    /// The filename-encoding collaborator wired into the dispatch engine.
    pub converter: Arc<dyn Converter>,
}

impl RuntimeOptions {
    /// Resolves CLI flags into runtime options, rejecting combinations that
    /// cannot be honored (`--background` without `--listen`, an unknown
    /// `--local-encoding` label).
    pub fn from_cli(cli: &Cli) -> Result<Self, DaemonError> {
        if cli.background && cli.listen.is_none() {
            return Err(DaemonError::BackgroundWithoutListen);
        }

        let converter: Arc<dyn Converter> = match &cli.local_encoding {
            Some(label) => build_converter(label)?,
            None => Arc::new(Utf8Passthrough),
        };

        Ok(Self {
            readonly: cli.readonly,
            chroot: cli.chroot.clone(),
            user: cli.user.clone(),
            listen: cli.listen,
            host: cli.host,
            background: cli.background,
            workers: cli.workers,
            converter,
        })
    }

    /// Whether this process should run the standalone TCP daemon loop
    /// rather than serve a single connection over stdio. Derived from
    /// `--listen` alone, never from argv[0] or any other heuristic.
    #[must_use]
    pub const fn standalone(&self) -> bool {
        self.listen.is_some()
    }
}

#[cfg(feature = "iconv")]
fn build_converter(label: &str) -> Result<Arc<dyn Converter>, DaemonError> {
    protocol::convert::EncodingRsConverter::for_label(label)
        .map(|converter| Arc::new(converter) as Arc<dyn Converter>)
        .ok_or_else(|| DaemonError::UnknownEncoding(label.to_string()))
}

#[cfg(not(feature = "iconv"))]
fn build_converter(label: &str) -> Result<Arc<dyn Converter>, DaemonError> {
    Err(DaemonError::UnknownEncoding(label.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_without_listen_is_rejected() {
        let cli = Cli {
            background: true,
            listen: None,
            ..Cli::default_for_tests()
        };
        assert!(matches!(
            RuntimeOptions::from_cli(&cli),
            Err(DaemonError::BackgroundWithoutListen)
        ));
    }

    #[test]
    fn listen_alone_selects_standalone_mode() {
        let cli = Cli {
            listen: Some(2022),
            ..Cli::default_for_tests()
        };
        let options = RuntimeOptions::from_cli(&cli).unwrap();
        assert!(options.standalone());
    }

    #[test]
    fn no_listen_selects_subsystem_mode() {
        let options = RuntimeOptions::from_cli(&Cli::default_for_tests()).unwrap();
        assert!(!options.standalone());
    }
}

//! Command-line surface for both `sftp-server` (subsystem mode) and
//! `sftp-serverd` (standalone daemon mode) — both binaries share this one
//! flag set; only the combination of flags given decides which loop runs.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::Parser;

/// Pure-Rust SFTP subsystem server.
#[derive(Parser, Clone, Debug)]
#[command(name = "sftp-server", version)]
pub struct Cli {
    /// Raise logging verbosity; repeatable (`-d` for debug, `-dd` for
    /// per-request trace output).
    #[arg(short = 'd', long, action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Reject any request that would modify the filesystem.
    #[arg(short = 'R', long)]
    pub readonly: bool,

    /// Directory to `chroot` into before serving. Standalone mode only.
    #[arg(short = 'r', long, value_name = "PATH")]
    pub chroot: Option<PathBuf>,

    /// User to drop privileges to after chrooting. Standalone mode only.
    #[arg(short = 'u', long, value_name = "USER")]
    pub user: Option<String>,

    /// Run as a standalone TCP daemon on this port instead of serving one
    /// connection over stdio.
    #[arg(short = 'L', long, value_name = "PORT")]
    pub listen: Option<u16>,

    /// Bind address for standalone mode.
    #[arg(short = 'H', long, value_name = "HOST")]
    pub host: Option<IpAddr>,

    /// Force IPv4 for standalone mode.
    #[arg(short = '4')]
    pub ipv4_only: bool,

    /// Force IPv6 for standalone mode.
    #[arg(short = '6')]
    pub ipv6_only: bool,

    /// Daemonize (detach from the controlling terminal). Requires
    /// `--listen`.
    #[arg(short = 'b', long)]
    pub background: bool,

    /// Worker pool size.
    #[arg(long, default_value_t = 4)]
    pub workers: usize,

    /// Overrides the locale-derived local filename encoding.
    #[arg(long, value_name = "NAME")]
    pub local_encoding: Option<String>,
}

impl Cli {
    /// A `Cli` with every flag at its default, for tests that only care
    /// about overriding a couple of fields.
    #[cfg(test)]
    #[must_use]
    pub fn default_for_tests() -> Self {
        Self {
            debug: 0,
            readonly: false,
            chroot: None,
            user: None,
            listen: None,
            host: None,
            ipv4_only: false,
            ipv6_only: false,
            background: false,
            workers: 4,
            local_encoding: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn workers_defaults_to_four() {
        let cli = Cli::parse_from(["sftp-server"]);
        assert_eq!(cli.workers, 4);
    }
}

//! The standalone daemon's accept loop: bind once, then fork a child per
//! accepted connection, matching the reference server's one-process-per-
//! session model.

use std::net::{IpAddr, Ipv6Addr, TcpListener};

use nix::unistd::ForkResult;
use socket2::{Domain, Socket, Type};

use crate::config::RuntimeOptions;
use crate::error::DaemonError;
use crate::server;

/// Binds the configured listen address and serves forever, forking a child
/// per connection. Returns only on a fatal bind/accept error; a child never
/// returns from this function, it calls `_exit` once its connection ends.
pub fn run(options: &RuntimeOptions) -> Result<(), DaemonError> {
    let port = options.listen.expect("standalone mode implies --listen");
    let host = options.host.unwrap_or(IpAddr::V6(Ipv6Addr::UNSPECIFIED));

    let domain = if host.is_ipv4() { Domain::IPV4 } else { Domain::IPV6 };
    let socket = Socket::new(domain, Type::STREAM, None)?;
    socket.set_reuse_address(true)?;
    socket.bind(&std::net::SocketAddr::new(host, port).into())?;
    socket.listen(128)?;
    let listener: TcpListener = socket.into();

    platform::reap_children()?;

    #[cfg(feature = "sd-notify")]
    {
        // Ignore errors: not running under systemd (no NOTIFY_SOCKET) is the
        // common case, not a fault.
        let _ = sd_notify::notify(false, &[sd_notify::NotifyState::Ready]);
    }

    loop {
        let (stream, _peer) = match listener.accept() {
            Ok(pair) => pair,
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(%err, "accept failed");
                continue;
            }
        };

        // SAFETY: no other threads hold locks this process needs across the
        // fork; the child immediately execs into `server::serve` and exits
        // without returning to the caller's stack frame.
        match unsafe { nix::unistd::fork() } {
            Ok(ForkResult::Parent { .. }) => {
                drop(stream);
            }
            Ok(ForkResult::Child) => {
                let read_half = stream.try_clone().expect("duplicate connected socket");
                let _ = server::serve(read_half, stream, options);
                std::process::exit(0);
            }
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::error!(%err, "fork failed");
            }
        }
    }
}

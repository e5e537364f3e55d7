//! Unix privilege-drop, chroot, and signal helpers.

use std::ffi::CString;
use std::path::Path;

use nix::unistd::{Gid, Uid, User};
use thiserror::Error;

/// A privilege-drop or signal-handling operation failed.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// `chdir`/`chroot` into the jail root failed.
    #[error("chroot to {path:?} failed: {source}")]
    Chroot {
        /// The directory that was to become the new root.
        path: std::path::PathBuf,
        #[source]
        source: nix::Error,
    },
    /// No passwd entry exists for the requested user.
    #[error("no such user: {0}")]
    NoSuchUser(String),
    /// `initgroups`, `setgid`, or `setuid` failed.
    #[error("error dropping privileges to {user}: {source}")]
    DropFailed {
        /// The user privileges were being dropped to.
        user: String,
        #[source]
        source: nix::Error,
    },
    /// `setuid(0)` unexpectedly succeeded after the drop, meaning root
    /// privileges were not actually relinquished.
    #[error("setuid(0) unexpectedly succeeded after dropping privileges")]
    DropIneffective,
    /// Installing a signal handler failed.
    #[error("error installing signal handler: {0}")]
    Signal(#[source] nix::Error),
}

/// `chdir` then `chroot` into `path`. Must run before [`drop_privileges`],
/// since chroot requires root.
pub fn chroot_to(path: &Path) -> Result<(), PlatformError> {
    nix::unistd::chdir(path).map_err(|source| PlatformError::Chroot {
        path: path.to_path_buf(),
        source,
    })?;
    nix::unistd::chroot(".").map_err(|source| PlatformError::Chroot {
        path: path.to_path_buf(),
        source,
    })
}

/// Looks up `user`, calls `initgroups`, then drops to that user's uid/gid
/// in the only safe order: group before user. Verifies the drop actually
/// stuck by confirming a subsequent `setuid(0)` fails.
pub fn drop_privileges(user: &str) -> Result<(), PlatformError> {
    let passwd = User::from_name(user)
        .map_err(|source| PlatformError::DropFailed {
            user: user.to_string(),
            source,
        })?
        .ok_or_else(|| PlatformError::NoSuchUser(user.to_string()))?;

    let name = CString::new(user).map_err(|_| PlatformError::NoSuchUser(user.to_string()))?;
    nix::unistd::initgroups(&name, passwd.gid).map_err(|source| PlatformError::DropFailed {
        user: user.to_string(),
        source,
    })?;
    nix::unistd::setgid(passwd.gid).map_err(|source| PlatformError::DropFailed {
        user: user.to_string(),
        source,
    })?;
    nix::unistd::setuid(passwd.uid).map_err(|source| PlatformError::DropFailed {
        user: user.to_string(),
        source,
    })?;

    if nix::unistd::setuid(Uid::from_raw(0)).is_ok() {
        return Err(PlatformError::DropIneffective);
    }

    Ok(())
}

/// Ignores `SIGPIPE`. A write to a client that has gone away should
/// surface as `EPIPE` on that one write, not tear down the process with a
/// signal before the caller can report it as a STATUS response.
pub fn ignore_sigpipe() -> Result<(), PlatformError> {
    // SAFETY: `SigIgn` installs the default "ignore" disposition, which has
    // no handler to uphold async-signal-safety requirements for.
    unsafe {
        nix::sys::signal::signal(nix::sys::signal::Signal::SIGPIPE, nix::sys::signal::SigHandler::SigIgn)
    }
    .map_err(PlatformError::Signal)?;
    Ok(())
}

/// Installs a `SIGCHLD` handler that reaps exited children without
/// blocking, so the forking daemon's accept loop never accumulates
/// zombies.
pub fn reap_children() -> Result<(), PlatformError> {
    // SAFETY: the handler only calls `waitpid`, which is async-signal-safe.
    unsafe {
        nix::sys::signal::signal(
            nix::sys::signal::Signal::SIGCHLD,
            nix::sys::signal::SigHandler::Handler(reap_one_child),
        )
    }
    .map_err(PlatformError::Signal)?;
    Ok(())
}

extern "C" fn reap_one_child(_signal: libc::c_int) {
    use nix::sys::wait::{waitpid, WaitPidFlag};
    loop {
        match waitpid(None, Some(WaitPidFlag::WNOHANG)) {
            Ok(nix::sys::wait::WaitStatus::StillAlive) | Err(_) => break,
            Ok(_) => continue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chroot_into_nonexistent_path_fails() {
        let err = chroot_to(Path::new("/nonexistent-path-for-tests")).unwrap_err();
        assert!(matches!(err, PlatformError::Chroot { .. }));
    }

    #[test]
    fn dropping_to_unknown_user_fails() {
        let err = drop_privileges("no-such-user-xyz").unwrap_err();
        assert!(matches!(
            err,
            PlatformError::NoSuchUser(_) | PlatformError::DropFailed { .. }
        ));
    }

    #[test]
    fn ignoring_sigpipe_succeeds() {
        ignore_sigpipe().unwrap();
    }
}

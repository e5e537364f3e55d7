//! Wires [`platform`]'s chroot/privilege-drop primitives into startup,
//! in the one order that works: chroot while still root, then drop.

use crate::config::RuntimeOptions;
use crate::error::DaemonError;

/// Applies `--chroot`/`--user`, if given, before the accept loop starts
/// serving connections. A no-op if neither flag was supplied.
pub fn apply(options: &RuntimeOptions) -> Result<(), DaemonError> {
    if let Some(root) = &options.chroot {
        platform::chroot_to(root)?;
    }
    if let Some(user) = &options.user {
        platform::drop_privileges(user)?;
    }
    Ok(())
}

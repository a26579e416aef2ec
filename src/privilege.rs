// src/privilege.rs

use nix::unistd::Uid;

use crate::errors::{RebuildError, Result};

/// Refuse to continue when running with an effective uid of 0.
///
/// The daemon executes an arbitrary shell command on behalf of anyone who
/// can connect to it, so it must never do so as root.
pub fn refuse_root() -> Result<()> {
    check_uid(Uid::effective())
}

fn check_uid(uid: Uid) -> Result<()> {
    if uid.is_root() {
        return Err(RebuildError::RunningAsRoot);
    }
    Ok(())
}

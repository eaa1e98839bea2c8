//! Reads access-mode bits of a file as a small unsigned integer.
//!
//! On Unix this is the low twelve bits of `st_mode`: owner/group/other
//! read-write-execute plus setuid, setgid and sticky. Other platforms only
//! expose a read-only flag, which is mapped onto `0o444` / `0o666`. No
//! translation between the two models is attempted, so both trees are
//! expected to live on filesystems with the same permission model.

use std::path::{Path, PathBuf};

#[cfg(unix)]
const MODE_MASK: u32 = 0o7777;

#[derive(Debug, thiserror::Error)]
pub enum PermissionError {
    #[error("IO error: {0}")]
    Io(std::io::Error),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
}

/// Returns the mode bits of `path`, following symlinks.
pub fn read_permissions(path: &Path) -> Result<u32, PermissionError> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::PermissionDenied {
            PermissionError::PermissionDenied(path.to_path_buf())
        } else {
            PermissionError::Io(e)
        }
    })?;

    Ok(mode_of(&metadata.permissions()))
}

/// Mode bits from metadata that was already read, e.g. by `symlink_metadata`
/// for an entry that is not followed.
pub fn permissions_of(metadata: &std::fs::Metadata) -> u32 {
    mode_of(&metadata.permissions())
}

#[cfg(unix)]
fn mode_of(permissions: &std::fs::Permissions) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    permissions.mode() & MODE_MASK
}

#[cfg(not(unix))]
fn mode_of(permissions: &std::fs::Permissions) -> u32 {
    if permissions.readonly() { 0o444 } else { 0o666 }
}

/// Octal rendering without a prefix, e.g. `644` or `4755`.
pub fn format_mode(mode: u32) -> String {
    format!("{:o}", mode)
}

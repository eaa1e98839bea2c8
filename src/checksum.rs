use sha2::{Digest as _, Sha256};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ChecksumError {
    #[error("IO error: {0}")]
    Io(std::io::Error),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Not a regular file: {0}")]
    NotAFile(PathBuf),
    #[error("File modified during checksumming: {0}")]
    ConcurrentModification(PathBuf),
}

/// Hex encoded SHA-256 of a file's content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Digest(String);

impl Digest {
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Digest(hex.into())
    }

    pub fn as_hex(&self) -> &str {
        &self.0
    }

    /// First twelve hex characters, for console output.
    pub fn short(&self) -> String {
        let hex = self.as_hex();
        if hex.len() > 12 {
            format!("{}...", &hex[..12])
        } else {
            hex.to_string()
        }
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_hex())
    }
}

fn map_open_error(path: &Path, e: std::io::Error) -> ChecksumError {
    if e.kind() == std::io::ErrorKind::PermissionDenied {
        ChecksumError::PermissionDenied(path.to_path_buf())
    } else {
        ChecksumError::Io(e)
    }
}

/// Computes the SHA-256 digest of a file's content.
///
/// The file is streamed in fixed-size chunks so memory use does not depend on
/// file size. Symlinks are followed. The digest depends on content only.
///
/// # Errors (may be changed in the future)
/// - `ChecksumError::Io`: File doesn't exist or other I/O errors
/// - `ChecksumError::PermissionDenied`: Insufficient permissions to read the file
/// - `ChecksumError::NotAFile`: The path does not resolve to a regular file
/// - `ChecksumError::ConcurrentModification`: File was detected as being modified while
///   checksumming. Note that the absence of this error is *not* a guarantee that the
///   file was *not* modified.
pub fn checksum_file(path: &Path) -> Result<Digest, ChecksumError> {
    debug!("Checksumming {}", path.display());

    let metadata_before = std::fs::metadata(path).map_err(|e| map_open_error(path, e))?;
    if !metadata_before.is_file() {
        return Err(ChecksumError::NotAFile(path.to_path_buf()));
    }
    let mtime_before = metadata_before.modified().map_err(ChecksumError::Io)?;

    let mut file = File::open(path).map_err(|e| map_open_error(path, e))?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = file.read(&mut buffer).map_err(ChecksumError::Io)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    let mtime_after = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(ChecksumError::Io)?;

    if mtime_before != mtime_after {
        return Err(ChecksumError::ConcurrentModification(path.to_path_buf()));
    }

    let digest = Digest::from_hex(format!("{:x}", hasher.finalize()));

    debug!("Checksum of {} is {}", path.display(), digest);

    Ok(digest)
}

/// Computes the SHA-256 digest of a symlink's target path, without following
/// it. Two links compare equal when they point at the same place.
pub fn checksum_link_target(path: &Path) -> Result<Digest, ChecksumError> {
    let target = std::fs::read_link(path).map_err(|e| map_open_error(path, e))?;

    let mut hasher = Sha256::new();
    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStrExt;
        hasher.update(target.as_os_str().as_bytes());
    }
    #[cfg(not(unix))]
    {
        hasher.update(target.to_string_lossy().as_bytes());
    }
    let digest = Digest::from_hex(format!("{:x}", hasher.finalize()));

    debug!(
        "Link {} points at {}, digest {}",
        path.display(),
        target.display(),
        digest
    );

    Ok(digest)
}

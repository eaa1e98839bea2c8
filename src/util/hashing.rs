//! Canonical hashing helpers for stable fingerprints.
//!
//! Provides canonical encodings for byte fields, counters and paths used by
//! the run fingerprint.

use sha2::{Digest, Sha256};
use std::path::Path;

/// Hashes a byte field with an explicit length prefix.
///
/// Length-prefixing avoids delimiter ambiguities (for example embedded `|` or
/// newlines in file names) that can otherwise make distinct data serialize to
/// identical byte streams before hashing.
pub(crate) fn hash_field(hasher: &mut Sha256, bytes: &[u8]) {
    let len = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
    hasher.update(len.to_be_bytes());
    hasher.update(bytes);
}

/// Hashes a fixed-width integer field.
pub(crate) fn hash_u64_field(hasher: &mut Sha256, value: u64) {
    hasher.update(value.to_be_bytes());
}

/// Hashes a path while preserving platform identity semantics.
///
/// On Unix the raw OS bytes are hashed so distinct non-UTF-8 paths remain
/// distinct. Other platforms fall back to the lossy string form.
pub(crate) fn hash_path_field(hasher: &mut Sha256, path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStrExt;
        hash_field(hasher, path.as_os_str().as_bytes());
    }
    #[cfg(not(unix))]
    {
        hash_field(hasher, path.to_string_lossy().as_bytes());
    }
}

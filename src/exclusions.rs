//! Exclusion lists that opt specific paths out of one comparison axis.
//!
//! The file format is one path per line. Only the line terminator (`\n` or
//! `\r\n`) is stripped, so leading and trailing spaces are part of the name.
//! Lines that are empty or whitespace only, and lines starting with `#`, are
//! ignored. Entries are target-relative paths; an absolute entry is accepted
//! when it lies under the target root and is rewritten relative to it.
//! Entries that cannot be normalized are skipped with a warning.
//!
//! On Unix an entry that is not valid UTF-8 is taken as raw file name bytes.
//! Elsewhere it is an error.

use crate::rel_path::RelativePath;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum ExclusionError {
    #[error("Failed to read exclusion file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    entries: BTreeSet<RelativePath>,
}

impl ExclusionSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads an exclusion list.
    ///
    /// `None` (or an empty path) means nothing is excluded and no file is
    /// opened. A named file that cannot be read is an error.
    pub fn load(file: Option<&Path>, target_root: &Path) -> Result<Self, ExclusionError> {
        let Some(file) = file.filter(|f| !f.as_os_str().is_empty()) else {
            return Ok(Self::empty());
        };

        let io_error = |source: std::io::Error| {
            if source.kind() == std::io::ErrorKind::PermissionDenied {
                ExclusionError::PermissionDenied(file.to_path_buf())
            } else {
                ExclusionError::Io {
                    path: file.to_path_buf(),
                    source,
                }
            }
        };

        let reader = BufReader::new(File::open(file).map_err(io_error)?);
        let mut entries = BTreeSet::new();

        for (index, line) in reader.split(b'\n').enumerate() {
            let line = line.map_err(io_error)?;
            let entry = line.strip_suffix(b"\r").unwrap_or(&line);
            if entry.iter().all(u8::is_ascii_whitespace) || entry.starts_with(b"#") {
                continue;
            }

            match parse_entry(entry, target_root).map_err(io_error)? {
                Some(path) => {
                    entries.insert(path);
                }
                None => warn!(
                    "Skipping malformed exclusion entry {:?} ({}:{})",
                    String::from_utf8_lossy(entry),
                    file.display(),
                    index + 1
                ),
            }
        }

        debug!(
            "Loaded {} exclusion entries from {}",
            entries.len(),
            file.display()
        );

        Ok(ExclusionSet { entries })
    }

    pub fn contains(&self, path: &RelativePath) -> bool {
        self.entries.contains(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<RelativePath> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = RelativePath>>(iter: I) -> Self {
        ExclusionSet {
            entries: iter.into_iter().collect(),
        }
    }
}

fn parse_entry(entry: &[u8], target_root: &Path) -> std::io::Result<Option<RelativePath>> {
    match std::str::from_utf8(entry) {
        Ok(text) => Ok(parse_text_entry(text, target_root)),
        Err(e) => parse_raw_entry(entry, target_root, e),
    }
}

fn parse_text_entry(entry: &str, target_root: &Path) -> Option<RelativePath> {
    let as_path = Path::new(entry);
    if as_path.is_absolute() {
        return parse_absolute(as_path, target_root);
    }
    RelativePath::new(entry).ok()
}

#[cfg(unix)]
fn parse_raw_entry(
    entry: &[u8],
    target_root: &Path,
    _: std::str::Utf8Error,
) -> std::io::Result<Option<RelativePath>> {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let as_path = Path::new(OsStr::from_bytes(entry));
    if as_path.is_absolute() {
        return Ok(parse_absolute(as_path, target_root));
    }
    Ok(RelativePath::from_path(as_path).ok())
}

#[cfg(not(unix))]
fn parse_raw_entry(
    _: &[u8],
    _: &Path,
    e: std::str::Utf8Error,
) -> std::io::Result<Option<RelativePath>> {
    Err(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

fn parse_absolute(path: &Path, target_root: &Path) -> Option<RelativePath> {
    let relative = path.strip_prefix(target_root).ok()?;
    RelativePath::from_path(relative).ok()
}

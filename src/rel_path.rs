//! Tree-relative paths used as the join key between two inventories.
//!
//! A `RelativePath` is never empty and never contains `.`, `..`, root or
//! prefix components. Normalization happens at construction, so two values
//! compare equal exactly when they name the same file relative to their
//! respective tree roots.
//!
//! Names are kept as raw OS strings. A file name that is not valid UTF-8 is
//! still a distinct key; only its rendering is escaped.

use std::fmt;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelativePathError {
    #[error("Path is empty: {0:?}")]
    Empty(String),
    #[error("Path is absolute: {0}")]
    Absolute(String),
    #[error("Path escapes its root: {0}")]
    EscapesRoot(String),
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelativePath {
    inner: PathBuf,
}

impl RelativePath {
    /// Normalizes a textual path.
    ///
    /// Both `/` and `\` are accepted as separators. `.` segments are dropped
    /// and `..` segments are resolved lexically.
    pub fn new(raw: &str) -> Result<Self, RelativePathError> {
        if raw.starts_with('/') || raw.starts_with('\\') || has_drive_prefix(raw) {
            return Err(RelativePathError::Absolute(raw.to_string()));
        }

        let mut inner = PathBuf::new();
        for segment in raw.split(['/', '\\']) {
            match segment {
                "" | "." => {}
                ".." => {
                    if !inner.pop() {
                        return Err(RelativePathError::EscapesRoot(raw.to_string()));
                    }
                }
                other => inner.push(other),
            }
        }

        Self::non_empty(inner, raw)
    }

    /// Builds a relative path from a filesystem path that is already relative
    /// to some root, e.g. the result of `Path::strip_prefix`. Components are
    /// taken as raw OS strings.
    pub fn from_path(path: &Path) -> Result<Self, RelativePathError> {
        let mut inner = PathBuf::new();
        for component in path.components() {
            match component {
                Component::Normal(part) => inner.push(part),
                Component::CurDir => {}
                Component::ParentDir => {
                    if !inner.pop() {
                        return Err(RelativePathError::EscapesRoot(render_path(path)));
                    }
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(RelativePathError::Absolute(render_path(path)));
                }
            }
        }

        Self::non_empty(inner, &render_path(path))
    }

    fn non_empty(inner: PathBuf, raw: &str) -> Result<Self, RelativePathError> {
        if inner.as_os_str().is_empty() {
            return Err(RelativePathError::Empty(raw.to_string()));
        }
        Ok(RelativePath { inner })
    }

    pub fn as_path(&self) -> &Path {
        &self.inner
    }

    /// Joins this path onto `root` using native separators.
    pub fn under(&self, root: &Path) -> PathBuf {
        root.join(&self.inner)
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_path(&self.inner))
    }
}

impl PartialEq<str> for RelativePath {
    fn eq(&self, other: &str) -> bool {
        RelativePath::new(other).is_ok_and(|other| *self == other)
    }
}

impl PartialEq<&str> for RelativePath {
    fn eq(&self, other: &&str) -> bool {
        *self == **other
    }
}

/// Renders a path for one line of output.
///
/// Plain UTF-8 paths are written as they are. A path that is not valid UTF-8
/// or that contains a control character (a newline, for instance) is written
/// quoted and escaped, so it can neither be confused with another path nor
/// split a line in two.
pub fn render_path(path: &Path) -> String {
    match path.to_str() {
        Some(text) if !text.chars().any(char::is_control) => text.to_string(),
        _ => format!("{:?}", path),
    }
}

fn has_drive_prefix(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

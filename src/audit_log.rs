//! The four append-only audit artifacts, one per alert kind.
//!
//! Every append opens the file in append mode, writes one line and closes it
//! again, so entries accumulate across runs until [`AuditLog::clear`] removes
//! the files.

use crate::finding::{Finding, FindingKind};
use crate::inventory::Reading;
use crate::permissions::format_mode;
use crate::rel_path::render_path;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum AuditLogError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to remove {path}: {source}")]
    Remove {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{0:?} findings are not logged")]
    NotLogged(FindingKind),
}

/// File name of the artifact a finding kind is appended to.
pub fn artifact_name(kind: FindingKind) -> Option<&'static str> {
    match kind {
        FindingKind::Matched => None,
        FindingKind::ChecksumConflict => Some("conflicts.log"),
        FindingKind::PermissionConflict => Some("permission_conflicts.log"),
        FindingKind::TargetOnly => Some("target_specific.log"),
        FindingKind::BaseOnly => Some("base_specific.log"),
    }
}

#[derive(Debug, Clone)]
pub struct AuditLog {
    dir: PathBuf,
}

impl AuditLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        AuditLog { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn artifact_path(&self, kind: FindingKind) -> Option<PathBuf> {
        artifact_name(kind).map(|name| self.dir.join(name))
    }

    /// Appends `line` plus a newline to the artifact for `kind`, creating the
    /// file if needed.
    pub fn append(&self, kind: FindingKind, line: &str) -> Result<(), AuditLogError> {
        let path = self
            .artifact_path(kind)
            .ok_or(AuditLogError::NotLogged(kind))?;

        let write = || -> std::io::Result<()> {
            let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
            file.write_all(format!("{line}\n").as_bytes())
        };

        write().map_err(|source| AuditLogError::Write {
            path: path.clone(),
            source,
        })
    }

    /// Removes all four artifacts. Missing files are not an error, so calling
    /// this repeatedly is fine. Returns how many files were removed.
    pub fn clear(&self) -> Result<usize, AuditLogError> {
        let mut removed = 0;
        for kind in FindingKind::ALERTS {
            let Some(path) = self.artifact_path(kind) else {
                continue;
            };
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    debug!("Removed {}", path.display());
                    removed += 1;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(source) => return Err(AuditLogError::Remove { path, source }),
            }
        }
        Ok(removed)
    }
}

/// Formats the audit line for an alert finding, or `None` for matches.
///
/// Lines name the file under the tree it was observed in: the target root for
/// conflicts and target-only files, the base root for base-only files.
pub fn log_line(finding: &Finding, base_root: &Path, target_root: &Path) -> Option<String> {
    let under = |root: &Path| render_path(&finding.path().under(root));

    match finding {
        Finding::Matched { .. } => None,
        Finding::ChecksumConflict { .. } | Finding::TargetOnly { .. } => Some(under(target_root)),
        Finding::PermissionConflict { base, target, .. } => Some(format!(
            "{} (base: {}, target: {})",
            under(target_root),
            mode_or_unavailable(base),
            mode_or_unavailable(target)
        )),
        Finding::BaseOnly { .. } => Some(under(base_root)),
    }
}

pub(crate) fn mode_or_unavailable(mode: &Reading<u32>) -> String {
    match mode {
        Reading::Available(mode) => format_mode(*mode),
        Reading::Unavailable(_) => "unavailable".to_string(),
    }
}

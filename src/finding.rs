use crate::checksum::Digest;
use crate::inventory::Reading;
use crate::rel_path::RelativePath;

/// Comparison axis a match was established on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Axis {
    Content,
    Permissions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FindingKind {
    Matched,
    ChecksumConflict,
    PermissionConflict,
    TargetOnly,
    BaseOnly,
}

impl FindingKind {
    pub const ALERTS: [FindingKind; 4] = [
        FindingKind::ChecksumConflict,
        FindingKind::PermissionConflict,
        FindingKind::TargetOnly,
        FindingKind::BaseOnly,
    ];

    pub fn is_alert(self) -> bool {
        self != FindingKind::Matched
    }

    /// Short code used in console output and fingerprints.
    pub fn code(self) -> &'static str {
        match self {
            FindingKind::Matched => ".",
            FindingKind::ChecksumConflict => "C",
            FindingKind::PermissionConflict => "P",
            FindingKind::TargetOnly => "T",
            FindingKind::BaseOnly => "B",
        }
    }
}

/// Classification of one relative path produced by the diff engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    Matched {
        path: RelativePath,
        axis: Axis,
    },
    /// Digests differ, or at least one side could not be read.
    ChecksumConflict {
        path: RelativePath,
        base: Reading<Digest>,
        target: Reading<Digest>,
    },
    /// Mode bits differ, or at least one side could not be read.
    PermissionConflict {
        path: RelativePath,
        base: Reading<u32>,
        target: Reading<u32>,
    },
    TargetOnly {
        path: RelativePath,
    },
    BaseOnly {
        path: RelativePath,
    },
}

impl Finding {
    pub fn path(&self) -> &RelativePath {
        match self {
            Finding::Matched { path, .. }
            | Finding::ChecksumConflict { path, .. }
            | Finding::PermissionConflict { path, .. }
            | Finding::TargetOnly { path }
            | Finding::BaseOnly { path } => path,
        }
    }

    pub fn kind(&self) -> FindingKind {
        match self {
            Finding::Matched { .. } => FindingKind::Matched,
            Finding::ChecksumConflict { .. } => FindingKind::ChecksumConflict,
            Finding::PermissionConflict { .. } => FindingKind::PermissionConflict,
            Finding::TargetOnly { .. } => FindingKind::TargetOnly,
            Finding::BaseOnly { .. } => FindingKind::BaseOnly,
        }
    }

    /// Whether the conflict stems from an unreadable side rather than a
    /// genuine difference.
    pub fn has_unavailable_side(&self) -> bool {
        match self {
            Finding::ChecksumConflict { base, target, .. } => {
                !base.is_available() || !target.is_available()
            }
            Finding::PermissionConflict { base, target, .. } => {
                !base.is_available() || !target.is_available()
            }
            _ => false,
        }
    }
}

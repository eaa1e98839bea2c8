use crate::audit_log::AuditLog;
use crate::config::CompareConfig;
use crate::diff::{Exclusions, compare_inventories};
use crate::exclusions::{ExclusionError, ExclusionSet};
use crate::finding::FindingKind;
use crate::inventory::{InventoryError, build_inventory, resolve_root};
use crate::sink::ReportSink;
use crate::rel_path::RelativePath;
use crate::util::hashing::{hash_field, hash_path_field, hash_u64_field};
use base64::Engine;
use sha2::{Digest, Sha256};
use std::io::Write;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum CompareError {
    #[error("Exclusion file error: {0}")]
    Exclusions(#[from] ExclusionError),
    #[error("Cannot inventory base tree: {0}")]
    BaseRoot(InventoryError),
    #[error("Cannot inventory target tree: {0}")]
    TargetRoot(InventoryError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonSummary {
    pub matched: usize,
    pub checksum_conflicts: usize,
    pub permission_conflicts: usize,
    pub target_only: usize,
    pub base_only: usize,
    pub log_write_failures: usize,
    /// A unique fingerprint of the set of alerts.
    ///
    /// This is currently a Base64-encoded SHA-256 over the sorted alerts, so
    /// two runs over unchanged trees produce the same value regardless of
    /// emission order.
    pub fingerprint: String,
}

impl ComparisonSummary {
    pub fn alert_count(&self) -> usize {
        self.checksum_conflicts + self.permission_conflicts + self.target_only + self.base_only
    }

    pub fn is_clean(&self) -> bool {
        self.alert_count() == 0
    }
}

/// Runs one verification pass of `config.target` against `config.base`.
///
/// Both roots are resolved and both exclusion lists loaded before anything
/// is read from either tree. Both inventories are complete before the first
/// finding is emitted. Alerts are written to `out` and appended to the audit
/// log in `config.log_dir`.
///
/// # Errors
///
/// Only fatal conditions are returned: an unusable root or an exclusion file
/// that was named but could not be read. Per-file problems are reported as
/// findings instead.
pub fn run_comparison<W: Write>(
    config: &CompareConfig,
    out: W,
) -> Result<(ComparisonSummary, W), CompareError> {
    let base_root = resolve_root(&config.base).map_err(CompareError::BaseRoot)?;
    let target_root = resolve_root(&config.target).map_err(CompareError::TargetRoot)?;

    let exclusions = Exclusions {
        hash: ExclusionSet::load(config.hash_exclusions.as_deref(), &target_root)?,
        permissions: ExclusionSet::load(config.perm_exclusions.as_deref(), &target_root)?,
    };

    for (axis, set) in [("checksum", &exclusions.hash), ("permission", &exclusions.permissions)] {
        if !set.is_empty() {
            info!("{} paths excluded from {} comparison", set.len(), axis);
        }
    }

    let base = build_inventory(&base_root).map_err(CompareError::BaseRoot)?;
    let target = build_inventory(&target_root).map_err(CompareError::TargetRoot)?;

    info!(
        "Comparing {} files in {} against {} files in {}",
        target.len(),
        target.root.display(),
        base.len(),
        base.root.display()
    );

    let mut sink = ReportSink::new(
        out,
        AuditLog::new(&config.log_dir),
        base.root.clone(),
        target.root.clone(),
        config.show_matches,
    );

    compare_inventories(&base, &target, &exclusions, config.options, &mut sink);

    let summary = ComparisonSummary {
        matched: sink.count(FindingKind::Matched),
        checksum_conflicts: sink.count(FindingKind::ChecksumConflict),
        permission_conflicts: sink.count(FindingKind::PermissionConflict),
        target_only: sink.count(FindingKind::TargetOnly),
        base_only: sink.count(FindingKind::BaseOnly),
        log_write_failures: sink.log_write_failures(),
        fingerprint: compute_fingerprint(sink.alerts()),
    };

    Ok((summary, sink.into_writer()))
}

fn compute_fingerprint(alerts: &[(FindingKind, RelativePath)]) -> String {
    let mut sorted: Vec<&(FindingKind, RelativePath)> = alerts.iter().collect();
    sorted.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));

    let mut hasher = Sha256::new();
    hash_u64_field(&mut hasher, sorted.len() as u64);
    for (kind, path) in sorted {
        hash_field(&mut hasher, kind.code().as_bytes());
        hash_path_field(&mut hasher, path.as_path());
    }

    base64::engine::general_purpose::STANDARD.encode(hasher.finalize())
}

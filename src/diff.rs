//! Classification of every relative path across a base and a target
//! inventory.
//!
//! Pass A walks the target inventory: paths present on both sides are
//! compared on the content axis and the permission axis independently, paths
//! missing from the base are `TargetOnly`. Pass B walks the base inventory and
//! reports paths missing from the target as `BaseOnly`.
//!
//! A side whose digest or mode could not be read never matches: the axis is
//! reported as a conflict. Content only matches between entries of the same
//! kind, so a symlink never matches a regular file.

use crate::exclusions::ExclusionSet;
use crate::finding::{Axis, Finding};
use crate::inventory::{FileRecord, Inventory, Reading};
use crate::rel_path::RelativePath;
use crate::sink::FindingSink;

/// Whether an excluded path that exists on only one side is still reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExclusionPolicy {
    /// A path in the hash-exclusion set is exempt from every kind of
    /// reporting, including existence mismatches.
    #[default]
    Lenient,
    /// Exclusions only suppress the axis they name; one-sided paths are
    /// always reported.
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompareOptions {
    pub check_content: bool,
    pub check_permissions: bool,
    pub exclusion_policy: ExclusionPolicy,
}

impl Default for CompareOptions {
    fn default() -> Self {
        CompareOptions {
            check_content: true,
            check_permissions: true,
            exclusion_policy: ExclusionPolicy::Lenient,
        }
    }
}

/// Both exclusion lists of a run.
#[derive(Debug, Clone, Default)]
pub struct Exclusions {
    pub hash: ExclusionSet,
    pub permissions: ExclusionSet,
}

/// Runs both passes, emitting every finding to `sink` as it is produced.
pub fn compare_inventories(
    base: &Inventory,
    target: &Inventory,
    exclusions: &Exclusions,
    options: CompareOptions,
    sink: &mut dyn FindingSink,
) {
    let suppress_one_sided = |path: &RelativePath| {
        options.exclusion_policy == ExclusionPolicy::Lenient && exclusions.hash.contains(path)
    };

    for (path, target_record) in target.iter() {
        match base.get(path) {
            Some(base_record) => {
                if options.check_content && !exclusions.hash.contains(path) {
                    sink.emit(&compare_content(path, base_record, target_record));
                }
                if options.check_permissions && !exclusions.permissions.contains(path) {
                    sink.emit(&compare_permissions(path, base_record, target_record));
                }
            }
            None => {
                if !suppress_one_sided(path) {
                    sink.emit(&Finding::TargetOnly { path: path.clone() });
                }
            }
        }
    }

    for (path, _) in base.iter() {
        if !target.contains(path) && !suppress_one_sided(path) {
            sink.emit(&Finding::BaseOnly { path: path.clone() });
        }
    }
}

/// Collecting form of [`compare_inventories`].
#[cfg(test)]
pub fn diff(
    base: &Inventory,
    target: &Inventory,
    exclusions: &Exclusions,
    options: CompareOptions,
) -> Vec<Finding> {
    let mut findings = Vec::new();
    compare_inventories(base, target, exclusions, options, &mut findings);
    findings
}

fn compare_content(
    path: &RelativePath,
    base: &FileRecord,
    target: &FileRecord,
) -> Finding {
    match (&base.digest, &target.digest) {
        (Reading::Available(b), Reading::Available(t)) if b == t && base.kind == target.kind => {
            Finding::Matched {
                path: path.clone(),
                axis: Axis::Content,
            }
        }
        _ => Finding::ChecksumConflict {
            path: path.clone(),
            base: base.digest.clone(),
            target: target.digest.clone(),
        },
    }
}

fn compare_permissions(
    path: &RelativePath,
    base: &FileRecord,
    target: &FileRecord,
) -> Finding {
    match (&base.permissions, &target.permissions) {
        (Reading::Available(b), Reading::Available(t)) if b == t => Finding::Matched {
            path: path.clone(),
            axis: Axis::Permissions,
        },
        _ => Finding::PermissionConflict {
            path: path.clone(),
            base: base.permissions.clone(),
            target: target.permissions.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::Digest;
    use crate::finding::FindingKind;
    use crate::inventory::EntryKind;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn rel(path: &str) -> RelativePath {
        RelativePath::new(path).unwrap()
    }

    fn record(digest: &str, mode: u32) -> FileRecord {
        FileRecord {
            kind: EntryKind::File,
            digest: Reading::Available(Digest::from_hex(digest)),
            permissions: Reading::Available(mode),
        }
    }

    fn inventory(root: &str, files: Vec<(&str, FileRecord)>) -> Inventory {
        Inventory {
            root: PathBuf::from(root),
            files: files
                .into_iter()
                .map(|(path, record)| (rel(path), record))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn exclusions(hash: &[&str], permissions: &[&str]) -> Exclusions {
        Exclusions {
            hash: hash.iter().map(|p| rel(p)).collect(),
            permissions: permissions.iter().map(|p| rel(p)).collect(),
        }
    }

    fn kinds_for<'a>(findings: &'a [Finding], path: &str) -> Vec<&'a Finding> {
        findings.iter().filter(|f| f.path() == &path).collect()
    }

    fn count(findings: &[Finding], kind: FindingKind) -> usize {
        findings.iter().filter(|f| f.kind() == kind).count()
    }

    #[test]
    fn test_identical_file_matches_on_both_axes() {
        let base = inventory("/base", vec![("a.txt", record("x", 0o644))]);
        let target = inventory("/target", vec![("a.txt", record("x", 0o644))]);

        let findings = diff(&base, &target, &Exclusions::default(), CompareOptions::default());

        assert_eq!(
            findings,
            vec![
                Finding::Matched {
                    path: rel("a.txt"),
                    axis: Axis::Content
                },
                Finding::Matched {
                    path: rel("a.txt"),
                    axis: Axis::Permissions
                },
            ]
        );
    }

    #[test]
    fn test_content_difference_is_checksum_conflict() {
        let base = inventory("/base", vec![("a.txt", record("x", 0o644))]);
        let target = inventory("/target", vec![("a.txt", record("y", 0o644))]);

        let findings = diff(&base, &target, &Exclusions::default(), CompareOptions::default());

        assert_eq!(count(&findings, FindingKind::ChecksumConflict), 1);
        assert_eq!(count(&findings, FindingKind::Matched), 1);
        assert!(findings.contains(&Finding::Matched {
            path: rel("a.txt"),
            axis: Axis::Permissions
        }));
    }

    #[test]
    fn test_mode_difference_is_permission_conflict() {
        let base = inventory("/base", vec![("d.txt", record("x", 0o644))]);
        let target = inventory("/target", vec![("d.txt", record("x", 0o600))]);

        let findings = diff(&base, &target, &Exclusions::default(), CompareOptions::default());

        assert_eq!(
            findings,
            vec![
                Finding::Matched {
                    path: rel("d.txt"),
                    axis: Axis::Content
                },
                Finding::PermissionConflict {
                    path: rel("d.txt"),
                    base: Reading::Available(0o644),
                    target: Reading::Available(0o600),
                },
            ]
        );
    }

    #[test]
    fn test_one_sided_paths() {
        let base = inventory("/base", vec![("b.txt", record("x", 0o644))]);
        let target = inventory("/target", vec![("c.txt", record("x", 0o644))]);

        let findings = diff(&base, &target, &Exclusions::default(), CompareOptions::default());

        assert_eq!(
            findings,
            vec![
                Finding::TargetOnly { path: rel("c.txt") },
                Finding::BaseOnly { path: rel("b.txt") },
            ]
        );
    }

    #[test]
    fn test_permission_exclusion_only_suppresses_permission_axis() {
        let base = inventory("/base", vec![("d.txt", record("x", 0o644))]);
        let target = inventory("/target", vec![("d.txt", record("y", 0o600))]);

        let findings = diff(
            &base,
            &target,
            &exclusions(&[], &["d.txt"]),
            CompareOptions::default(),
        );

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind(), FindingKind::ChecksumConflict);
    }

    #[test]
    fn test_hash_exclusion_removes_all_content_findings() {
        let base = inventory(
            "/base",
            vec![("same.txt", record("x", 0o644)), ("diff.txt", record("x", 0o644))],
        );
        let target = inventory(
            "/target",
            vec![("same.txt", record("x", 0o600)), ("diff.txt", record("y", 0o644))],
        );
        let excluded = exclusions(&["same.txt", "diff.txt"], &[]);

        for _ in 0..2 {
            let findings = diff(&base, &target, &excluded, CompareOptions::default());

            assert!(!findings.iter().any(|f| matches!(
                f,
                Finding::ChecksumConflict { .. }
                    | Finding::Matched {
                        axis: Axis::Content,
                        ..
                    }
            )));
            assert_eq!(count(&findings, FindingKind::PermissionConflict), 1);
            assert_eq!(kinds_for(&findings, "diff.txt").len(), 1);
        }
    }

    #[test]
    fn test_lenient_policy_suppresses_excluded_one_sided_paths() {
        let base = inventory("/base", vec![("gone.txt", record("x", 0o644))]);
        let target = inventory("/target", vec![("new.txt", record("x", 0o644))]);

        let findings = diff(
            &base,
            &target,
            &exclusions(&["gone.txt", "new.txt"], &[]),
            CompareOptions::default(),
        );

        assert!(findings.is_empty());
    }

    #[test]
    fn test_permission_exclusion_does_not_suppress_one_sided_paths() {
        let base = inventory("/base", vec![("gone.txt", record("x", 0o644))]);
        let target = inventory("/target", vec![]);

        let findings = diff(
            &base,
            &target,
            &exclusions(&[], &["gone.txt"]),
            CompareOptions::default(),
        );

        assert_eq!(findings, vec![Finding::BaseOnly { path: rel("gone.txt") }]);
    }

    #[test]
    fn test_strict_policy_reports_excluded_one_sided_paths() {
        let base = inventory("/base", vec![("gone.txt", record("x", 0o644))]);
        let target = inventory("/target", vec![("new.txt", record("x", 0o644))]);
        let options = CompareOptions {
            exclusion_policy: ExclusionPolicy::Strict,
            ..CompareOptions::default()
        };

        let findings = diff(
            &base,
            &target,
            &exclusions(&["gone.txt", "new.txt"], &[]),
            options,
        );

        assert_eq!(
            findings,
            vec![
                Finding::TargetOnly {
                    path: rel("new.txt")
                },
                Finding::BaseOnly {
                    path: rel("gone.txt")
                },
            ]
        );
    }

    #[test]
    fn test_global_ignore_flags_suppress_whole_axis() {
        let base = inventory("/base", vec![("a.txt", record("x", 0o644))]);
        let target = inventory(
            "/target",
            vec![("a.txt", record("y", 0o600)), ("extra.txt", record("z", 0o644))],
        );

        let no_content = CompareOptions {
            check_content: false,
            ..CompareOptions::default()
        };
        let findings = diff(&base, &target, &Exclusions::default(), no_content);
        assert_eq!(count(&findings, FindingKind::ChecksumConflict), 0);
        assert_eq!(count(&findings, FindingKind::PermissionConflict), 1);
        assert_eq!(count(&findings, FindingKind::TargetOnly), 1);

        let no_permissions = CompareOptions {
            check_permissions: false,
            ..CompareOptions::default()
        };
        let findings = diff(&base, &target, &Exclusions::default(), no_permissions);
        assert_eq!(count(&findings, FindingKind::ChecksumConflict), 1);
        assert_eq!(count(&findings, FindingKind::PermissionConflict), 0);
        assert_eq!(count(&findings, FindingKind::TargetOnly), 1);
    }

    #[test]
    fn test_unavailable_digest_is_never_a_match() {
        let unreadable = FileRecord {
            kind: EntryKind::Unreadable,
            digest: Reading::Unavailable("Permission denied".to_string()),
            permissions: Reading::Unavailable("Permission denied".to_string()),
        };
        let base = inventory("/base", vec![("locked.txt", unreadable.clone())]);
        let target = inventory("/target", vec![("locked.txt", unreadable)]);

        let findings = diff(&base, &target, &Exclusions::default(), CompareOptions::default());

        assert_eq!(count(&findings, FindingKind::Matched), 0);
        assert_eq!(count(&findings, FindingKind::ChecksumConflict), 1);
        assert_eq!(count(&findings, FindingKind::PermissionConflict), 1);
        assert!(findings.iter().all(|f| f.has_unavailable_side()));
    }

    #[test]
    fn test_each_path_visited_once_per_axis() {
        let files = vec![
            ("a.txt", record("1", 0o644)),
            ("dir/b.txt", record("2", 0o755)),
            ("dir/sub/c.txt", record("3", 0o600)),
        ];
        let base = inventory("/base", files.clone());
        let target = inventory("/target", files);

        let findings = diff(&base, &target, &Exclusions::default(), CompareOptions::default());

        assert_eq!(findings.len(), 6);
        for path in ["a.txt", "dir/b.txt", "dir/sub/c.txt"] {
            assert_eq!(kinds_for(&findings, path).len(), 2);
        }
    }

    #[test]
    fn test_symlink_never_matches_regular_file() {
        let link = FileRecord {
            kind: EntryKind::Symlink,
            ..record("aaaa", 0o777)
        };
        let base = inventory("/base", vec![("etc", record("aaaa", 0o777))]);
        let target = inventory("/target", vec![("etc", link)]);

        let findings = diff(&base, &target, &Exclusions::default(), CompareOptions::default());

        assert_eq!(count(&findings, FindingKind::ChecksumConflict), 1);
        assert_eq!(count(&findings, FindingKind::Matched), 1);
    }

    #[test]
    fn test_unreadable_entry_on_one_side_is_target_only() {
        let fifo = FileRecord {
            kind: EntryKind::Unreadable,
            digest: Reading::Unavailable("not a regular file".to_string()),
            permissions: Reading::Available(0o600),
        };
        let base = inventory("/base", vec![]);
        let target = inventory("/target", vec![("pipe", fifo)]);

        let findings = diff(&base, &target, &Exclusions::default(), CompareOptions::default());

        assert_eq!(
            findings,
            vec![Finding::TargetOnly {
                path: rel("pipe")
            }]
        );
    }
}

use crate::audit_log::{AuditLog, log_line, mode_or_unavailable};
use crate::finding::{Axis, Finding, FindingKind};
use crate::inventory::Reading;
use crate::permissions::format_mode;
use crate::rel_path::RelativePath;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, error};

/// Consumer of findings as the diff engine produces them.
pub trait FindingSink {
    fn emit(&mut self, finding: &Finding);
}

impl FindingSink for Vec<Finding> {
    fn emit(&mut self, finding: &Finding) {
        self.push(finding.clone());
    }
}

/// Sink used by the `compare` command.
///
/// Every alert is written to `out` and appended to the audit log; matches are
/// written only when `show_matches` is set and are never logged. A failed log
/// append is reported and counted but does not stop the run.
pub struct ReportSink<W: Write> {
    out: W,
    audit_log: AuditLog,
    base_root: PathBuf,
    target_root: PathBuf,
    show_matches: bool,
    counts: BTreeMap<FindingKind, usize>,
    alerts: Vec<(FindingKind, RelativePath)>,
    log_write_failures: usize,
}

impl<W: Write> ReportSink<W> {
    pub fn new(
        out: W,
        audit_log: AuditLog,
        base_root: PathBuf,
        target_root: PathBuf,
        show_matches: bool,
    ) -> Self {
        ReportSink {
            out,
            audit_log,
            base_root,
            target_root,
            show_matches,
            counts: BTreeMap::new(),
            alerts: Vec::new(),
            log_write_failures: 0,
        }
    }

    pub fn count(&self, kind: FindingKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// `(kind, path)` of every alert emitted so far, in emission order.
    pub fn alerts(&self) -> &[(FindingKind, RelativePath)] {
        &self.alerts
    }

    pub fn log_write_failures(&self) -> usize {
        self.log_write_failures
    }

    pub fn into_writer(self) -> W {
        self.out
    }

    fn write_console(&mut self, line: &str) {
        if let Err(e) = writeln!(self.out, "{line}") {
            error!("Failed to write report line: {e}");
        }
    }
}

impl<W: Write> FindingSink for ReportSink<W> {
    fn emit(&mut self, finding: &Finding) {
        let kind = finding.kind();
        *self.counts.entry(kind).or_insert(0) += 1;

        if !kind.is_alert() {
            if self.show_matches {
                self.write_console(&console_line(finding));
            }
            return;
        }

        if finding.has_unavailable_side() {
            debug!("{} is unreadable on one side; reporting it as a conflict", finding.path());
        }

        self.alerts.push((kind, finding.path().clone()));
        self.write_console(&console_line(finding));

        if let Some(line) = log_line(finding, &self.base_root, &self.target_root)
            && let Err(e) = self.audit_log.append(kind, &line)
        {
            error!("{e}");
            self.log_write_failures += 1;
        }
    }
}

/// One console line per finding: a short status code followed by the path and
/// any detail worth showing.
pub fn console_line(finding: &Finding) -> String {
    let detail = match finding {
        Finding::Matched {
            axis: Axis::Content,
            ..
        } => " (content)".to_string(),
        Finding::Matched {
            axis: Axis::Permissions,
            ..
        } => " (permissions)".to_string(),
        Finding::ChecksumConflict { base, target, .. } => match (base, target) {
            (Reading::Available(b), Reading::Available(t)) => {
                format!(" (sha256: {} -> {})", b.short(), t.short())
            }
            _ => format!(" ({})", unavailable_detail(base, target)),
        },
        Finding::PermissionConflict { base, target, .. } => match (base, target) {
            (Reading::Available(b), Reading::Available(t)) => {
                format!(" (base: {}, target: {})", format_mode(*b), format_mode(*t))
            }
            _ => format!(
                " (base: {}, target: {}; {})",
                mode_or_unavailable(base),
                mode_or_unavailable(target),
                unavailable_detail(base, target)
            ),
        },
        Finding::TargetOnly { .. } | Finding::BaseOnly { .. } => String::new(),
    };

    format!("{:<2} {}{}", finding.kind().code(), finding.path(), detail)
}

fn unavailable_detail<T>(base: &Reading<T>, target: &Reading<T>) -> String {
    let mut parts = Vec::new();
    if let Reading::Unavailable(reason) = base {
        parts.push(format!("base unavailable: {reason}"));
    }
    if let Reading::Unavailable(reason) = target {
        parts.push(format!("target unavailable: {reason}"));
    }
    parts.join("; ")
}

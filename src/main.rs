mod audit_log;
mod checksum;
mod cli;
mod compare;
mod config;
mod diff;
mod exclusions;
mod finding;
mod inventory;
mod permissions;
mod rel_path;
mod sink;
mod util;

use audit_log::AuditLog;
use cli::{Cli, Command, LogLevel};
use compare::{ComparisonSummary, run_comparison};
use config::{CompareConfig, CompareOverrides, ConfigFile, resolve_log_dir};
use inventory::{EntryKind, build_inventory};
use std::fmt as stdfmt;
use std::io::{IsTerminal, Write, stderr, stdout};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{Event, Level, Subscriber, error, info, warn};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt as tracing_fmt;
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;

struct AuditExitCode;

impl AuditExitCode {
    /// Exit code used when the comparison produced at least one alert.
    fn alerts_found() -> ExitCode {
        ExitCode::from(1)
    }

    /// Exit code used for other errors (I/O errors, invalid arguments, etc.).
    fn any_error() -> ExitCode {
        ExitCode::from(255)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.log_level);

    // Change working directory if -C was specified
    if let Some(directory) = cli.directory
        && let Err(e) = std::env::set_current_dir(&directory)
    {
        error!(
            "Failed to change directory to {}: {}",
            directory.display(),
            e
        );
        return AuditExitCode::any_error();
    }

    let result: anyhow::Result<ExitCode> = match cli.command {
        Command::Compare {
            base,
            target,
            hash_exclusions,
            perm_exclusions,
            ignore_checksums,
            ignore_permissions,
            strict_exclusions,
            show_matches,
            log_dir,
            config,
        } => handle_compare(
            CompareOverrides {
                base,
                target,
                hash_exclusions,
                perm_exclusions,
                ignore_checksums,
                ignore_permissions,
                strict_exclusions,
                show_matches,
                log_dir,
            },
            config,
        ),
        Command::Clear { log_dir, config } => handle_clear(log_dir, config),
        Command::Inventory { path } => handle_inventory(&path),
    };

    match result {
        Ok(exit_code) => exit_code,
        Err(err) => {
            error!("{err}");
            AuditExitCode::any_error()
        }
    }
}

fn load_config_file(path: Option<PathBuf>) -> anyhow::Result<Option<ConfigFile>> {
    Ok(path.map(|p| ConfigFile::load(&p)).transpose()?)
}

fn handle_compare(
    overrides: CompareOverrides,
    config_path: Option<PathBuf>,
) -> anyhow::Result<ExitCode> {
    let config_file = load_config_file(config_path)?;
    let config = CompareConfig::resolve(overrides, config_file.as_ref())?;

    let (summary, mut out) = run_comparison(&config, stdout().lock())?;

    writeln!(out, "{}", format_summary(&summary))?;

    if summary.log_write_failures > 0 {
        warn!(
            "{} findings could not be written to the audit logs in {}",
            summary.log_write_failures,
            config.log_dir.display()
        );
    }

    if summary.is_clean() {
        info!("Comparison clean: no conflicts or one-sided files");
        return Ok(ExitCode::SUCCESS);
    }

    writeln!(out, "Fingerprint: {}", summary.fingerprint)?;

    info!(
        "Findings were appended to the audit logs in {}",
        config.log_dir.display()
    );

    Ok(AuditExitCode::alerts_found())
}

fn format_summary(summary: &ComparisonSummary) -> String {
    format!(
        "Summary: {} matched, {} checksum conflicts, {} permission conflicts, {} target-only, {} base-only",
        summary.matched,
        summary.checksum_conflicts,
        summary.permission_conflicts,
        summary.target_only,
        summary.base_only
    )
}

fn handle_clear(log_dir: Option<PathBuf>, config_path: Option<PathBuf>) -> anyhow::Result<ExitCode> {
    let config_file = load_config_file(config_path)?;
    let audit_log = AuditLog::new(resolve_log_dir(log_dir, config_file.as_ref()));

    let removed = audit_log.clear()?;

    info!(
        "Removed {} log files from {}",
        removed,
        audit_log.dir().display()
    );

    Ok(ExitCode::SUCCESS)
}

fn handle_inventory(path: &Path) -> anyhow::Result<ExitCode> {
    let inventory = build_inventory(path)?;
    let mut out = stdout().lock();

    for (relative, record) in inventory.iter() {
        let mode = record
            .permissions
            .available()
            .map_or_else(|| "-".to_string(), |mode| format!("{:04o}", mode));
        let digest = record
            .digest
            .available()
            .map_or_else(|| "-".to_string(), |digest| digest.to_string());
        match record.kind {
            EntryKind::Symlink => writeln!(out, "{} {} {} (symlink)", mode, digest, relative)?,
            EntryKind::File | EntryKind::Unreadable => {
                writeln!(out, "{} {} {}", mode, digest, relative)?
            }
        }
    }

    if inventory.is_empty() {
        warn!("No entries found under {}", inventory.root.display());
    }

    info!("Inventoried {} entries", inventory.len());

    Ok(ExitCode::SUCCESS)
}

fn init_tracing(verbose: u8, log_level: Option<LogLevel>) {
    let stderr_is_terminal = stderr().is_terminal();
    let formatter = EmojiFormatter { stderr_is_terminal };

    let filter = match (log_level, verbose) {
        (Some(level), _) => EnvFilter::new(level.as_filter()),
        (None, 0) => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        (None, 1) => EnvFilter::new("info"),
        (None, _) => EnvFilter::new("debug"),
    };

    let fmt_layer = tracing_fmt::layer()
        .event_format(formatter)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

struct EmojiFormatter {
    stderr_is_terminal: bool,
}

impl<S, N> FormatEvent<S, N> for EmojiFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> stdfmt::Result {
        if self.stderr_is_terminal {
            match *event.metadata().level() {
                Level::TRACE | Level::DEBUG => write!(writer, "🔍 ")?,
                Level::INFO => write!(writer, "ℹ️ ")?,
                Level::WARN => write!(writer, "⚠️  ")?,
                Level::ERROR => write!(writer, "❌️ ")?,
                _ => {}
            }
        } else {
            match *event.metadata().level() {
                Level::TRACE => writer.write_str("TRACE: ")?,
                Level::DEBUG => writer.write_str("DEBUG: ")?,
                Level::INFO => writer.write_str("INFO: ")?,
                Level::WARN => writer.write_str("WARN: ")?,
                Level::ERROR => writer.write_str("ERROR: ")?,
                _ => {}
            }
        }

        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

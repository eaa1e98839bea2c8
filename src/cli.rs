mod help_text;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// File integrity tool for comparing a target tree against a trusted base tree
#[derive(Parser, Debug)]
#[command(name = "treeaudit", version, about, long_about = help_text::ROOT_LONG_ABOUT)]
pub struct Cli {
    /// Change to DIRECTORY before doing anything
    #[arg(short = 'C', value_name = "DIRECTORY", global = true)]
    pub directory: Option<PathBuf>,

    #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true,
        conflicts_with = "log_level",
        help = "Increase log output (-v for info, -vv for debug). Takes precedence over RUST_LOG."
    )]
    pub verbose: u8,

    #[arg(
        long,
        value_name = "LEVEL",
        global = true,
        help = "Set the log level. Takes precedence over RUST_LOG."
    )]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compare a target tree against a base tree
    #[command(long_about = help_text::COMPARE_LONG_ABOUT)]
    Compare {
        /// Trusted reference tree
        #[arg(short, long, value_name = "DIR")]
        base: Option<PathBuf>,

        /// Tree to check against the base
        #[arg(short, long, value_name = "DIR")]
        target: Option<PathBuf>,

        /// File listing paths excluded from checksum comparison
        #[arg(long, visible_alias = "xh", value_name = "FILE")]
        hash_exclusions: Option<PathBuf>,

        /// File listing paths excluded from permission comparison
        #[arg(long, visible_alias = "xp", value_name = "FILE")]
        perm_exclusions: Option<PathBuf>,

        /// Skip checksum comparison entirely
        #[arg(long)]
        ignore_checksums: bool,

        /// Skip permission comparison entirely
        #[arg(long)]
        ignore_permissions: bool,

        /// Report one-sided files even when they are hash-excluded
        #[arg(long)]
        strict_exclusions: bool,

        /// Also print matched files
        #[arg(long)]
        show_matches: bool,

        /// Directory the audit logs are appended to (default: current directory)
        #[arg(long, value_name = "DIR")]
        log_dir: Option<PathBuf>,

        /// TOML file with default settings
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Remove the audit log files
    #[command(long_about = help_text::CLEAR_LONG_ABOUT)]
    Clear {
        /// Directory holding the audit logs (default: current directory)
        #[arg(long, value_name = "DIR")]
        log_dir: Option<PathBuf>,

        /// TOML file to read the log directory from
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Print checksum and permissions of every file in one tree
    #[command(long_about = help_text::INVENTORY_LONG_ABOUT)]
    Inventory {
        /// Tree to inventory
        #[arg(value_name = "PATH", default_value = ".")]
        path: PathBuf,
    },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}

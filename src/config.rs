//! Run configuration.
//!
//! A comparison is configured by command line flags, optionally layered over a
//! TOML config file. Flags win over file values; boolean flags can only turn a
//! behavior on. Relative paths inside a config file are resolved against the
//! directory containing that file.

use crate::diff::{CompareOptions, ExclusionPolicy};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Unsupported config file version: {0}")]
    UnsupportedVersion(u32),
    #[error("No base directory given (use --base or set compare.base in the config file)")]
    MissingBase,
    #[error("No target directory given (use --target or set compare.target in the config file)")]
    MissingTarget,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
struct Metadata {
    version: u32,
}

/// Only the metadata section, so the version can be checked before the rest
/// of the file is interpreted.
#[derive(Debug, Deserialize)]
struct MetadataOnly {
    metadata: Metadata,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompareSection {
    pub base: Option<PathBuf>,
    pub target: Option<PathBuf>,
    pub hash_exclusions: Option<PathBuf>,
    pub perm_exclusions: Option<PathBuf>,
    pub ignore_checksums: Option<bool>,
    pub ignore_permissions: Option<bool>,
    pub exclusion_policy: Option<ExclusionPolicy>,
    pub show_matches: Option<bool>,
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    metadata: Metadata,
    #[serde(default)]
    pub compare: CompareSection,
}

impl ConfigFile {
    const SUPPORTED_VERSION: u32 = 1;

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let metadata_only: MetadataOnly = toml::from_str(content)?;

        if metadata_only.metadata.version != Self::SUPPORTED_VERSION {
            return Err(ConfigError::UnsupportedVersion(
                metadata_only.metadata.version,
            ));
        }

        Ok(toml::from_str(content)?)
    }

    /// Loads a config file, resolving its relative paths against the file's
    /// own directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::PermissionDenied {
                ConfigError::PermissionDenied(path.to_path_buf())
            } else {
                ConfigError::Io {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;

        let mut config = Self::from_toml(&content)?;
        let anchor = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        config.compare.anchor_paths(anchor);
        Ok(config)
    }
}

impl CompareSection {
    fn anchor_paths(&mut self, anchor: &Path) {
        for path in [
            &mut self.base,
            &mut self.target,
            &mut self.hash_exclusions,
            &mut self.perm_exclusions,
            &mut self.log_dir,
        ]
        .into_iter()
        .flatten()
        {
            if path.is_relative() {
                *path = anchor.join(&*path);
            }
        }
    }
}

/// Values given on the command line. `None` / `false` defer to the config
/// file.
#[derive(Debug, Clone, Default)]
pub struct CompareOverrides {
    pub base: Option<PathBuf>,
    pub target: Option<PathBuf>,
    pub hash_exclusions: Option<PathBuf>,
    pub perm_exclusions: Option<PathBuf>,
    pub ignore_checksums: bool,
    pub ignore_permissions: bool,
    pub strict_exclusions: bool,
    pub show_matches: bool,
    pub log_dir: Option<PathBuf>,
}

/// Fully resolved configuration of one comparison run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompareConfig {
    pub base: PathBuf,
    pub target: PathBuf,
    pub hash_exclusions: Option<PathBuf>,
    pub perm_exclusions: Option<PathBuf>,
    pub options: CompareOptions,
    pub show_matches: bool,
    pub log_dir: PathBuf,
}

impl CompareConfig {
    pub fn resolve(
        overrides: CompareOverrides,
        file: Option<&ConfigFile>,
    ) -> Result<Self, ConfigError> {
        let section = file.map(|f| f.compare.clone()).unwrap_or_default();

        let base = overrides
            .base
            .or(section.base)
            .ok_or(ConfigError::MissingBase)?;
        let target = overrides
            .target
            .or(section.target)
            .ok_or(ConfigError::MissingTarget)?;

        let exclusion_policy = if overrides.strict_exclusions {
            ExclusionPolicy::Strict
        } else {
            section.exclusion_policy.unwrap_or_default()
        };

        let ignore_checksums =
            overrides.ignore_checksums || section.ignore_checksums.unwrap_or(false);
        let ignore_permissions =
            overrides.ignore_permissions || section.ignore_permissions.unwrap_or(false);

        Ok(CompareConfig {
            base,
            target,
            hash_exclusions: overrides.hash_exclusions.or(section.hash_exclusions),
            perm_exclusions: overrides.perm_exclusions.or(section.perm_exclusions),
            options: CompareOptions {
                check_content: !ignore_checksums,
                check_permissions: !ignore_permissions,
                exclusion_policy,
            },
            show_matches: overrides.show_matches || section.show_matches.unwrap_or(false),
            log_dir: resolve_log_dir(overrides.log_dir, file),
        })
    }
}

/// Log directory precedence: flag, config file, current directory.
pub fn resolve_log_dir(flag: Option<PathBuf>, file: Option<&ConfigFile>) -> PathBuf {
    flag.or_else(|| file.and_then(|f| f.compare.log_dir.clone()))
        .unwrap_or_else(|| PathBuf::from("."))
}

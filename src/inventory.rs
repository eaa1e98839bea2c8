//! Recursive tree inventory.
//!
//! Walks a directory tree sequentially, depth first, visiting the entries of
//! each directory in name order, and records a `FileRecord` for every entry
//! keyed by its path relative to the tree root. Readable directories are
//! descended into but never recorded.
//!
//! A symlink that resolves to a regular file is recorded with the content and
//! mode of its target. Any other symlink (to a directory, dangling, or to a
//! special file) is not followed and is recorded by the path it points at.
//! Entries whose content cannot be read at all, such as FIFOs, devices or
//! directories that cannot be listed, are recorded with an unavailable
//! digest so the comparison reports them. Only a root that cannot be read is
//! fatal.

use crate::checksum::{Digest, checksum_file, checksum_link_target};
use crate::permissions::{permissions_of, read_permissions};
use crate::rel_path::RelativePath;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("IO error: {0}")]
    Io(std::io::Error),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Outcome of reading one attribute of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reading<T> {
    Available(T),
    Unavailable(String),
}

impl<T> Reading<T> {
    pub fn available(&self) -> Option<&T> {
        match self {
            Reading::Available(value) => Some(value),
            Reading::Unavailable(_) => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Reading::Available(_))
    }
}

impl<T, E: std::fmt::Display> From<Result<T, E>> for Reading<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Reading::Available(value),
            Err(e) => Reading::Unavailable(e.to_string()),
        }
    }
}

/// What a recorded entry is on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A regular file, or a symlink resolving to one.
    File,
    /// A symlink that does not resolve to a regular file. The digest is taken
    /// over the link target path.
    Symlink,
    /// An entry whose content cannot be read: a special file, a directory
    /// that cannot be listed, or an entry that cannot be stat'ed.
    Unreadable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub kind: EntryKind,
    pub digest: Reading<Digest>,
    pub permissions: Reading<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inventory {
    /// Canonical root the relative paths are computed against.
    pub root: PathBuf,
    pub files: BTreeMap<RelativePath, FileRecord>,
}

impl Inventory {
    pub fn get(&self, path: &RelativePath) -> Option<&FileRecord> {
        self.files.get(path)
    }

    pub fn contains(&self, path: &RelativePath) -> bool {
        self.files.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RelativePath, &FileRecord)> {
        self.files.iter()
    }

    /// Number of entries recorded as `EntryKind::Unreadable`.
    pub fn unreadable_count(&self) -> usize {
        self.files
            .values()
            .filter(|record| record.kind == EntryKind::Unreadable)
            .count()
    }
}

/// Canonicalizes `root` and checks that it is a directory.
pub fn resolve_root(root: &Path) -> Result<PathBuf, InventoryError> {
    let canonical = root.canonicalize().map_err(|e| {
        if e.kind() == std::io::ErrorKind::PermissionDenied {
            InventoryError::PermissionDenied(root.to_path_buf())
        } else {
            InventoryError::Io(e)
        }
    })?;

    if !canonical.is_dir() {
        return Err(InventoryError::NotADirectory(canonical));
    }

    Ok(canonical)
}

/// Builds the inventory of every entry under `root`.
///
/// # Errors
///
/// Only failures at the root itself are returned: the root does not exist, is
/// not a directory, or cannot be listed. Everything below the root is
/// recorded, with `Unavailable` attributes where reading failed.
pub fn build_inventory(root: &Path) -> Result<Inventory, InventoryError> {
    let root = resolve_root(root)?;

    info!("Building inventory of {}", root.display());

    let root_listing = read_sorted_dir(&root).map_err(|e| {
        if e.kind() == std::io::ErrorKind::PermissionDenied {
            InventoryError::PermissionDenied(root.clone())
        } else {
            InventoryError::Io(e)
        }
    })?;

    let mut inventory = Inventory {
        root: root.clone(),
        files: BTreeMap::new(),
    };

    walk_entries(&root, root_listing, &mut inventory);

    info!(
        "Inventoried {} entries under {} ({} unreadable)",
        inventory.files.len(),
        root.display(),
        inventory.unreadable_count()
    );

    Ok(inventory)
}

fn read_sorted_dir(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut children = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        children.push(entry?.path());
    }
    children.sort();
    Ok(children)
}

fn walk_entries(root: &Path, children: Vec<PathBuf>, inventory: &mut Inventory) {
    for path in children {
        visit_entry(root, &path, inventory);
    }
}

fn visit_entry(root: &Path, path: &Path, inventory: &mut Inventory) {
    // Every listed child lies under the root, so this only fails on a walk bug.
    let relative = match path
        .strip_prefix(root)
        .map_err(|e| e.to_string())
        .and_then(|p| RelativePath::from_path(p).map_err(|e| e.to_string()))
    {
        Ok(relative) => relative,
        Err(reason) => {
            error!("Cannot record {}: {}", path.display(), reason);
            return;
        }
    };

    let metadata = match std::fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) => {
            let reason = format!("cannot stat: {e}");
            return record_unreadable(inventory, relative, path, reason, None);
        }
    };
    let file_type = metadata.file_type();

    if file_type.is_dir() {
        match read_sorted_dir(path) {
            Ok(children) => walk_entries(root, children, inventory),
            Err(e) => {
                let reason = format!("cannot list directory: {e}");
                record_unreadable(inventory, relative, path, reason, Some(&metadata));
            }
        }
        return;
    }

    if file_type.is_symlink() {
        if !std::fs::metadata(path).is_ok_and(|target| target.is_file()) {
            debug!("Recording symlink {} by its target path", path.display());
            let record = FileRecord {
                kind: EntryKind::Symlink,
                digest: checksum_link_target(path).into(),
                permissions: Reading::Available(permissions_of(&metadata)),
            };
            warn_unavailable(path, &record);
            inventory.files.insert(relative, record);
            return;
        }
    } else if !file_type.is_file() {
        let reason = "not a regular file".to_string();
        return record_unreadable(inventory, relative, path, reason, Some(&metadata));
    }

    let record = FileRecord {
        kind: EntryKind::File,
        digest: checksum_file(path).into(),
        permissions: read_permissions(path).into(),
    };
    warn_unavailable(path, &record);
    inventory.files.insert(relative, record);
}

fn record_unreadable(
    inventory: &mut Inventory,
    relative: RelativePath,
    path: &Path,
    reason: String,
    metadata: Option<&std::fs::Metadata>,
) {
    warn!("Content of {} cannot be read: {}", path.display(), reason);
    let permissions = match metadata {
        Some(metadata) => Reading::Available(permissions_of(metadata)),
        None => Reading::Unavailable(reason.clone()),
    };
    inventory.files.insert(
        relative,
        FileRecord {
            kind: EntryKind::Unreadable,
            digest: Reading::Unavailable(reason),
            permissions,
        },
    );
}

fn warn_unavailable(path: &Path, record: &FileRecord) {
    if let Reading::Unavailable(reason) = &record.digest {
        warn!("Checksum unavailable for {}: {}", path.display(), reason);
    }
    if let Reading::Unavailable(reason) = &record.permissions {
        warn!("Permissions unavailable for {}: {}", path.display(), reason);
    }
}

pub(super) const ROOT_LONG_ABOUT: &str = "\
File integrity tool for comparing a target tree against a trusted base tree

Treeaudit builds an inventory of every regular file in two directory trees
(SHA-256 of the content plus the permission bits) and compares them by path
relative to each tree root. Differences are printed and appended to audit log
files so they can be reviewed later.

CORE CONCEPTS:

  Base and target:
    The base tree is the trusted reference (a golden image, a release
    artifact, a backup). The target tree is the copy being checked.

  Findings:
    C  checksum conflict: content differs
    P  permission conflict: mode bits differ
    T  target-only: file exists only in the target
    B  base-only: file exists only in the base
    .  matched (shown with --show-matches)

  Audit logs:
    Every C, P, T and B finding is appended to one of four log files in the
    log directory: conflicts.log, permission_conflicts.log,
    target_specific.log and base_specific.log. Logs accumulate across runs
    until 'treeaudit clear' removes them.

TYPICAL WORKFLOW:

  1. Compare a deployment against its release tree:
     $ treeaudit compare --base /srv/release --target /srv/www

  2. Review the audit logs:
     $ cat conflicts.log permission_conflicts.log

  3. Start over with fresh logs:
     $ treeaudit clear

EXIT CODES:

  0: No alerts (every compared file matched)
  1: At least one C, P, T or B finding
  255: Configuration error, unreadable root, or other fatal error
";

pub(super) const COMPARE_LONG_ABOUT: &str = "\
Compare the target tree against the base tree

Both trees are inventoried completely before any comparison starts. Files are
matched by their path relative to each tree root, so the two trees can live
anywhere on disk.

For every file present in both trees, content (SHA-256) and permission bits
are compared independently. A file that cannot be read on either side is
reported as a conflict, never as a match.

EXCLUSION FILES:

  --hash-exclusions and --perm-exclusions each name a text file with one path
  per line, relative to the target root. Blank lines and lines starting with
  '#' are ignored. Spaces are part of the name. Absolute paths under the
  target root are accepted too.

    # exhash.txt
    var/cache/index.db
    etc/hostname

  A path in the hash exclusion file is not checksum-compared. By default it
  is also not reported when it exists in only one of the trees; use
  --strict-exclusions to keep reporting those. A path in the permission
  exclusion file is not permission-compared.

  Naming an exclusion file that cannot be read is a fatal error.

CONFIG FILE:

  --config reads defaults from a TOML file. Command line flags take
  precedence. Relative paths are resolved against the config file's directory.

    [metadata]
    version = 1

    [compare]
    base = \"/srv/release\"
    target = \"/srv/www\"
    hash_exclusions = \"exhash.txt\"
    perm_exclusions = \"experm.txt\"
    ignore_checksums = false
    ignore_permissions = false
    exclusion_policy = \"lenient\"   # or \"strict\"
    show_matches = false
    log_dir = \"/var/log/treeaudit\"

OUTPUT:

  One line per finding, then a summary. When there are alerts a fingerprint
  of the alert set is printed; unchanged trees produce the same fingerprint
  on every run.

EXAMPLES:

  $ treeaudit compare -b ./base_dir -t ./target_dir
  $ treeaudit compare -b ./base_dir -t ./target_dir --hash-exclusions exhash.txt --perm-exclusions experm.txt
  $ treeaudit compare --config /etc/treeaudit.toml --log-dir /var/log/treeaudit
";

pub(super) const CLEAR_LONG_ABOUT: &str = "\
Remove the four audit log files

Deletes conflicts.log, permission_conflicts.log, target_specific.log and
base_specific.log from the log directory. Missing files are not an error, so
running it twice in a row is fine. Other files in the directory are left alone.
";

pub(super) const INVENTORY_LONG_ABOUT: &str = "\
Print the inventory of a single tree

Prints one line per entry: permission bits in octal, SHA-256 and the path
relative to the tree root. Useful for auditing one tree or as a starting point
for an exclusion file. Entries whose content cannot be read (special files,
unlistable directories) show '-'. Symlinks that do not point at a regular file
are not followed; their line hashes the link target and ends in '(symlink)'.
";

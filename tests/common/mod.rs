use assert_cmd::{Command, cargo::cargo_bin_cmd};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub fn treeaudit_cmd(cwd: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("treeaudit");
    cmd.arg("-C").arg(cwd);
    cmd
}

/// A base tree, a target tree and a log directory side by side in one
/// temporary directory.
#[allow(dead_code)]
pub struct Trees {
    pub temp: TempDir,
    pub base: PathBuf,
    pub target: PathBuf,
    pub logs: PathBuf,
}

// Not every test crate uses every helper.
#[allow(dead_code)]
impl Trees {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let base = temp.path().join("base");
        let target = temp.path().join("target");
        let logs = temp.path().join("logs");
        for dir in [&base, &target, &logs] {
            fs::create_dir(dir).unwrap();
        }
        Trees {
            temp,
            base,
            target,
            logs,
        }
    }

    /// `treeaudit compare` with both roots and the log directory filled in.
    pub fn compare_cmd(&self) -> Command {
        let mut cmd = treeaudit_cmd(self.temp.path());
        cmd.arg("compare")
            .arg("--base")
            .arg(&self.base)
            .arg("--target")
            .arg(&self.target)
            .arg("--log-dir")
            .arg(&self.logs);
        cmd
    }

    pub fn log(&self, name: &str) -> String {
        fs::read_to_string(self.logs.join(name)).unwrap_or_default()
    }

    pub fn canonical_base(&self) -> PathBuf {
        self.base.canonicalize().unwrap()
    }

    pub fn canonical_target(&self) -> PathBuf {
        self.target.canonicalize().unwrap()
    }
}

// Each integration test file is compiled as its own crate, and not all of
// them write files with explicit modes.
#[allow(dead_code)]
#[cfg(unix)]
pub fn write_with_mode(path: &Path, content: &str, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    fs::write(path, content).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
}

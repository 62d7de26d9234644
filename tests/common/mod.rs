#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

pub const SAMPLE_CSV: &str = "\
HostName,os,ansible_user,ansible_password,site,AdditionalGroups
nxos101,nxos,vars:ansible_user,vars:ansible_password,my_lab,red blue
nxos102,nxos,vars:ansible_user,vars:ansible_password,my_lab,blue yellow
eos10[1:2],eos,vars:ansible_user,vars:ansible_password,my_lab,orange red
vyos101[1:4],vyos,admin,vars:ansible_password,edge,orange
";

/// Scratch directory holding a CSV source and its inventory config.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Writes `csv` as `inventory.csv` and a `lab.csv.yaml` config pointing at
    /// it, with `options` appended verbatim to the YAML.
    pub fn inventory(&self, csv: &str, options: &str) -> PathBuf {
        let source = self.write("inventory.csv", csv);
        let yaml = format!(
            "plugin: csv\nsource: {}\n{options}",
            serde_json::to_string(&source.display().to_string()).expect("quote path")
        );
        self.write("lab.csv.yaml", &yaml)
    }
}

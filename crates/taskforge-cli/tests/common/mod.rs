//! A throwaway workspace with one typekit, one task library and a project.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

pub const BASE_TLB: &str = r#"<?xml version="1.0"?>
<typelib>
  <compound name="/base/Time">
    <field name="microseconds" type="/int64_t"/>
  </compound>
  <compound name="/base/Scratch">
    <field name="value" type="/double"/>
  </compound>
</typelib>
"#;

pub const BASE_TYPELIST: &str = "/base/Time\n/base/Scratch 0\n";

pub const DRIVERS: &str = r#"
name = "drivers"
using_typekit = ["base"]

[[task]]
name = "Device"
needs_configuration = true

[[task.output_port]]
name = "status"
type = "/base/Time"
"#;

pub const PROJECT: &str = r#"
name = "demo"
using_task_library = ["drivers"]

[[task]]
name = "Driver"
subclasses = "drivers::Device"

[[task.input_port]]
name = "cmd"
type = "/base/Time"
event = true

[[task]]
name = "Monitor"
"#;

pub struct Workspace {
    pub root: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self::with_project(PROJECT)
    }

    pub fn with_project(project: &str) -> Self {
        let root = TempDir::new().unwrap();
        let ws = Self { root };
        fs::create_dir_all(ws.path("typekits")).unwrap();
        fs::create_dir_all(ws.path("packages")).unwrap();
        fs::create_dir_all(ws.path("libraries")).unwrap();
        fs::create_dir_all(ws.path("demo")).unwrap();
        fs::create_dir_all(ws.path("home")).unwrap();

        fs::write(ws.path("typekits/base.tlb"), BASE_TLB).unwrap();
        fs::write(ws.path("typekits/base.typelist"), BASE_TYPELIST).unwrap();
        fs::write(ws.path("typekits/base.package"), "base-typekit").unwrap();
        fs::write(
            ws.path("packages/base-typekit.toml"),
            "include_dirs = [\"/opt/base/include\"]\n",
        )
        .unwrap();
        fs::write(ws.path("libraries/drivers.orogen.toml"), DRIVERS).unwrap();
        fs::write(ws.path("demo/demo.orogen.toml"), project).unwrap();
        ws
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.path().join(relative)
    }

    pub fn project_file(&self) -> PathBuf {
        self.path("demo/demo.orogen.toml")
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.path(relative)).unwrap()
    }

    /// `taskforge` running inside the workspace, isolated from the user's
    /// configuration and environment.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("taskforge").unwrap();
        cmd.current_dir(self.root.path())
            .env("HOME", self.path("home"))
            .env("XDG_CONFIG_HOME", self.path("home/.config"))
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG");
        for (key, _) in std::env::vars() {
            if key.starts_with("TASKFORGE__") {
                cmd.env_remove(key);
            }
        }
        cmd
    }

    /// `cmd()` with the search paths pointing into the workspace.
    pub fn searching(&self) -> Command {
        let mut cmd = self.cmd();
        cmd.env("TASKFORGE__SEARCH__TYPEKIT_PATHS", self.path("typekits"))
            .env("TASKFORGE__SEARCH__TASK_LIBRARY_PATHS", self.path("libraries"))
            .env("TASKFORGE__SEARCH__PACKAGE_PATHS", self.path("packages"));
        cmd
    }
}

pub fn exists(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}

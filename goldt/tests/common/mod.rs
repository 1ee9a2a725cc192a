//! Shared fixtures for the goldt end-to-end tests.
//!
//! Test "sources" are shell scripts and the "compiler" is `/bin/sh` running a
//! one-liner that copies the source into place, so no C toolchain is needed.

#![allow(dead_code)]

use std::path::PathBuf;

use assert_cmd::Command;
use tempfile::TempDir;

const CONFIG: &str = r#"tests_dir = "tests"

[compiler]
program = "/bin/sh"
flags = ["-c", 'if grep -q SYNTAX "$3"; then echo "$3: error: unexpected token" >&2; exit 1; fi; cp "$3" "$2" && chmod +x "$2"', "cc"]
"#;

/// A scratch project with a `tests/` directory and a `goldt.toml`.
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        std::fs::create_dir(dir.path().join("tests")).expect("Failed to create tests directory");
        std::fs::write(dir.path().join("goldt.toml"), CONFIG).expect("Failed to write config");
        Self { dir }
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    pub fn tests_dir(&self) -> PathBuf {
        self.dir.path().join("tests")
    }

    /// Add `tests/<name>.c` holding a shell script body.
    pub fn add_test(&self, name: &str, body: &str) {
        let source = format!("#!/bin/sh\n{}\n", body);
        std::fs::write(self.tests_dir().join(format!("{}.c", name)), source)
            .expect("Failed to write test source");
    }

    /// Add a test whose source the stand-in compiler rejects.
    pub fn add_broken_test(&self, name: &str) {
        std::fs::write(self.tests_dir().join(format!("{}.c", name)), "SYNTAX\n")
            .expect("Failed to write test source");
    }

    pub fn read(&self, file: &str) -> String {
        std::fs::read_to_string(self.tests_dir().join(file))
            .unwrap_or_else(|e| panic!("Failed to read {}: {}", file, e))
    }

    pub fn exists(&self, file: &str) -> bool {
        self.tests_dir().join(file).exists()
    }

    /// goldt, run from the project root with its config.
    pub fn goldt(&self) -> Command {
        let mut cmd = Command::new(goldt_bin());
        cmd.current_dir(self.dir.path())
            .env_remove("GOLDT_DIR")
            .env_remove("GOLDT_CC")
            .env_remove("GOLDT_VERBOSE")
            .arg("--config")
            .arg(self.dir.path().join("goldt.toml"))
            .arg("--no-color");
        cmd
    }
}

/// Get the path to the goldt binary
pub fn goldt_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_goldt"))
}

//! Test case discovery.
//!
//! A test case is a single source file in the test directory. Its name is
//! the file stem; the binary built from it sits next to it under that name.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{GoldtError, Result};

/// One source-to-binary unit under test.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestCase {
    name: String,
    root: PathBuf,
    extension: String,
}

impl TestCase {
    /// Create a test case named `name` living in `root`.
    pub fn new(root: impl Into<PathBuf>, name: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            extension: extension.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/<name>.<ext>`
    pub fn source_path(&self) -> PathBuf {
        self.root.join(format!("{}.{}", self.name, self.extension))
    }

    /// `<root>/<name>`
    pub fn binary_path(&self) -> PathBuf {
        self.root.join(&self.name)
    }

    /// Optional stdin fixture, `<root>/<name>.in`.
    pub fn input_path(&self) -> PathBuf {
        self.root.join(format!("{}.in", self.name))
    }
}

/// Scan `root` for files ending in `.<extension>`.
///
/// Names are de-duplicated and returned sorted so progress counters are the
/// same on every run.
pub fn discover(root: &Path, extension: &str) -> Result<Vec<TestCase>> {
    let entries = std::fs::read_dir(root).map_err(|cause| GoldtError::Discovery {
        path: root.to_path_buf(),
        cause,
    })?;

    let suffix = format!(".{}", extension);
    let mut names = BTreeSet::new();

    for entry in entries {
        let entry = entry.map_err(|cause| GoldtError::Discovery {
            path: root.to_path_buf(),
            cause,
        })?;

        if entry.path().is_dir() {
            continue;
        }

        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            debug!("Skipping non UTF-8 entry {:?}", entry.path());
            continue;
        };

        match file_name.strip_suffix(&suffix) {
            Some(stem) if !stem.is_empty() => {
                names.insert(stem.to_string());
            }
            _ => {}
        }
    }

    debug!("Discovered {} test(s) in {}", names.len(), root.display());

    Ok(names
        .into_iter()
        .map(|name| TestCase::new(root, name, extension))
        .collect())
}

//! Expected-state store.
//!
//! Each test keeps its golden snapshot in three sibling files:
//! `<name>.out.expected`, `<name>.err.expected` and `<name>.code.expected`.
//! Missing files are created empty on first load, so a test that was never
//! recorded degrades to empty expectations field by field.

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{GoldtError, Result};
use crate::toolchain::ExecutionResult;

/// Return code recorded for a test.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReturnCode {
    /// Nothing has been recorded yet.
    #[default]
    Unset,
    /// A recorded exit code.
    Recorded(i32),
}

impl ReturnCode {
    pub fn is_unset(self) -> bool {
        matches!(self, Self::Unset)
    }

    fn parse(path: &Path, text: &str) -> Result<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(Self::Unset);
        }
        let code: i32 = trimmed.parse().map_err(|_| GoldtError::InvalidReturnCode {
            path: path.to_path_buf(),
            text: text.to_string(),
        })?;
        // Older snapshots spell "never recorded" as a negative number.
        if code < 0 {
            Ok(Self::Unset)
        } else {
            Ok(Self::Recorded(code))
        }
    }

    fn render(self) -> String {
        match self {
            Self::Unset => String::new(),
            Self::Recorded(code) => code.to_string(),
        }
    }
}

impl fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => f.write_str("<unset>"),
            Self::Recorded(code) => write!(f, "{}", code),
        }
    }
}

/// Golden snapshot for one test. Streams are compared byte for byte.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpectedState {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub return_code: ReturnCode,
}

impl From<ExecutionResult> for ExpectedState {
    fn from(result: ExecutionResult) -> Self {
        Self {
            stdout: result.stdout,
            stderr: result.stderr,
            return_code: ReturnCode::Recorded(result.return_code),
        }
    }
}

/// Which of the three artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Out,
    Err,
    Code,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Out, Field::Err, Field::Code];

    pub fn tag(self) -> &'static str {
        match self {
            Self::Out => "out",
            Self::Err => "err",
            Self::Code => "code",
        }
    }
}

/// Filesystem-backed store rooted at the test directory.
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<root>/<name>.<tag>.expected`
    pub fn artifact_path(&self, name: &str, field: Field) -> PathBuf {
        self.root.join(format!("{}.{}.expected", name, field.tag()))
    }

    /// Load the snapshot for `name`, materializing empty artifacts for any
    /// field that has none.
    pub fn load(&self, name: &str) -> Result<ExpectedState> {
        let stdout = self.read_or_create(name, Field::Out)?;
        let stderr = self.read_or_create(name, Field::Err)?;
        let code = self.read_or_create(name, Field::Code)?;
        let return_code = ReturnCode::parse(
            &self.artifact_path(name, Field::Code),
            &String::from_utf8_lossy(&code),
        )?;

        Ok(ExpectedState {
            stdout,
            stderr,
            return_code,
        })
    }

    /// Overwrite all three artifacts for `name`.
    pub fn save(&self, name: &str, state: &ExpectedState) -> Result<()> {
        self.write(name, Field::Out, &state.stdout)?;
        self.write(name, Field::Err, &state.stderr)?;
        self.write(name, Field::Code, state.return_code.render().as_bytes())?;
        info!("Saved expected behaviour for {}", name);
        Ok(())
    }

    fn read_or_create(&self, name: &str, field: Field) -> Result<Vec<u8>> {
        let path = self.artifact_path(name, field);
        match std::fs::read(&path) {
            Ok(content) => Ok(content),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                std::fs::write(&path, "").map_err(|cause| GoldtError::Store {
                    path: path.clone(),
                    cause,
                })?;
                info!("Created empty {}.{}.expected", name, field.tag());
                Ok(Vec::new())
            }
            Err(cause) => Err(GoldtError::Store { path, cause }),
        }
    }

    fn write(&self, name: &str, field: Field, content: &[u8]) -> Result<()> {
        let path = self.artifact_path(name, field);
        std::fs::write(&path, content).map_err(|cause| GoldtError::Store { path, cause })
    }
}

//! Configuration module for goldt.
//!
//! This module handles loading `goldt.toml`, which describes
//! where the tests live, how they are compiled and how strictly their
//! output is compared.

use dirs::{config_dir, home_dir};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{GoldtError, Result};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "goldt.toml";

/// Application configuration structure.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Config {
    /// Directory holding the test sources and their expected artifacts.
    #[serde(default = "default_tests_dir")]
    pub tests_dir: PathBuf,

    /// Suffix (without the dot) that marks a test source file.
    #[serde(default = "default_source_extension")]
    pub source_extension: String,

    /// Kill compilers and test binaries that run longer than this.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Compiler invocation.
    #[serde(default)]
    pub compiler: CompilerConfig,

    /// Which captured streams beyond stdout must match.
    #[serde(default)]
    pub compare: CompareConfig,
}

/// How test sources are compiled.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CompilerConfig {
    /// Compiler executable.
    #[serde(default = "default_compiler")]
    pub program: String,

    /// Flags placed before `-o <binary> <source>`.
    #[serde(default = "default_compiler_flags")]
    pub flags: Vec<String>,
}

/// Opt-in comparison of the streams a plain run ignores.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
pub struct CompareConfig {
    /// Fail a run when stderr differs from the recording.
    #[serde(default)]
    pub stderr: bool,

    /// Fail a run when the exit code differs from the recording.
    #[serde(default)]
    pub return_code: bool,
}

fn default_tests_dir() -> PathBuf {
    PathBuf::from("tests")
}

fn default_source_extension() -> String {
    "c".to_string()
}

fn default_compiler() -> String {
    "gcc".to_string()
}

fn default_compiler_flags() -> Vec<String> {
    ["-Wextra", "-Wall", "-Wno-char-subscripts"]
        .iter()
        .map(|flag| flag.to_string())
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tests_dir: default_tests_dir(),
            source_extension: default_source_extension(),
            timeout_secs: None,
            compiler: CompilerConfig::default(),
            compare: CompareConfig::default(),
        }
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            program: default_compiler(),
            flags: default_compiler_flags(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Searches for configuration in the following order:
    /// 1. Current directory
    /// 2. User's home directory
    /// 3. System configuration directory
    ///
    /// Returns the default configuration if no config file is found.
    pub fn load() -> Result<Self> {
        match Self::find_config_file() {
            Some(path) => Self::load_from_path(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(GoldtError::Config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            GoldtError::Config(format!("Failed to parse configuration: {}", e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// The configured timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.source_extension.is_empty() || self.source_extension.starts_with('.') {
            return Err(GoldtError::Config(format!(
                "source_extension must be a bare suffix like \"c\", got {:?}",
                self.source_extension
            )));
        }
        if self.compiler.program.trim().is_empty() {
            return Err(GoldtError::Config(
                "compiler.program must not be empty".to_string(),
            ));
        }
        if self.timeout_secs == Some(0) {
            return Err(GoldtError::Config(
                "timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    fn check_current_dir_config() -> Option<PathBuf> {
        let path = PathBuf::from(CONFIG_FILE_NAME);
        path.exists().then_some(path)
    }

    fn check_home_config() -> Option<PathBuf> {
        home_dir()
            .map(|dir| dir.join(".config").join("goldt").join(CONFIG_FILE_NAME))
            .filter(|path| path.exists())
    }

    fn check_system_config() -> Option<PathBuf> {
        config_dir()
            .map(|dir| dir.join("goldt").join(CONFIG_FILE_NAME))
            .filter(|path| path.exists())
    }

    /// Find the configuration file in standard locations.
    fn find_config_file() -> Option<PathBuf> {
        Self::check_current_dir_config()
            .or_else(Self::check_home_config)
            .or_else(Self::check_system_config)
    }
}

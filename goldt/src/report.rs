//! Outcomes, batch summaries and the JSON report.

use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::error::Result;

/// Bracketed status tags printed in front of every per-test result.
pub mod tags {
    pub const PASS: &str = "[PASS]";
    pub const FAILED: &str = "[FAILED]";
    pub const ERROR: &str = "[ERROR]";
    pub const WARNING: &str = "[WARNING]";
    pub const SUCCESS: &str = "[SUCCESS]";
    pub const SKIP: &str = "[SKIP]";
}

/// A lifecycle step that runs over the whole discovered set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Build,
    Run,
    Record,
}

impl Step {
    /// Line printed after the batch when every test passed.
    pub fn all_passed_banner(self) -> Option<&'static str> {
        match self {
            Self::Build => Some("ALL TESTS BUILD"),
            Self::Run => Some("ALL TESTS PASS"),
            Self::Record => None,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Build => "BUILD",
            Self::Run => "RUN",
            Self::Record => "RECORD",
        })
    }
}

/// Per-test result of a step.
///
/// `build` and `run` produce `Pass`, `Failed` or `Error`; `record` produces
/// `Recorded`, `Skipped` or `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Pass,
    Failed,
    Error,
    Recorded,
    Skipped,
}

impl Outcome {
    /// Whether this outcome keeps a batch green.
    pub fn is_ok(self) -> bool {
        !matches!(self, Self::Failed | Self::Error)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseResult {
    pub name: String,
    pub outcome: Outcome,
}

/// Results of one step over every discovered test, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub step: Step,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub results: Vec<CaseResult>,
}

impl BatchSummary {
    pub fn new(step: Step) -> Self {
        Self {
            step,
            passed: 0,
            failed: 0,
            errored: 0,
            results: Vec::new(),
        }
    }

    pub fn push(&mut self, name: &str, outcome: Outcome) {
        match outcome {
            Outcome::Pass | Outcome::Recorded => self.passed += 1,
            Outcome::Failed => self.failed += 1,
            Outcome::Error => self.errored += 1,
            Outcome::Skipped => {}
        }
        self.results.push(CaseResult {
            name: name.to_string(),
            outcome,
        });
    }

    /// True when no test failed or errored.
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|result| result.outcome.is_ok())
    }
}

/// Write every batch of this invocation to `path` as pretty JSON.
pub fn write_json_report(path: &Path, batches: &[BatchSummary]) -> Result<()> {
    let json = serde_json::to_string_pretty(batches)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_counts() {
        let mut summary = BatchSummary::new(Step::Run);
        summary.push("arena", Outcome::Pass);
        summary.push("math", Outcome::Failed);
        summary.push("queue", Outcome::Error);

        assert_eq!(summary.results.len(), 3);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.errored, 1);
        assert!(!summary.all_passed());
    }

    #[test]
    fn test_empty_batch_passes() {
        assert!(BatchSummary::new(Step::Build).all_passed());
    }

    #[test]
    fn test_skips_do_not_fail_record() {
        let mut summary = BatchSummary::new(Step::Record);
        summary.push("arena", Outcome::Recorded);
        summary.push("math", Outcome::Skipped);

        assert!(summary.all_passed());
        assert_eq!(summary.passed, 1);
    }

    #[test]
    fn test_banners() {
        assert_eq!(Step::Build.all_passed_banner(), Some("ALL TESTS BUILD"));
        assert_eq!(Step::Run.all_passed_banner(), Some("ALL TESTS PASS"));
        assert_eq!(Step::Record.all_passed_banner(), None);
        assert_eq!(Step::Record.to_string(), "RECORD");
    }

    #[test]
    fn test_json_report() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");
        let mut summary = BatchSummary::new(Step::Run);
        summary.push("math", Outcome::Failed);

        write_json_report(&path, &[summary]).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[0]["step"], "run");
        assert_eq!(value[0]["failed"], 1);
        assert_eq!(value[0]["results"][0]["name"], "math");
        assert_eq!(value[0]["results"][0]["outcome"], "failed");
    }
}

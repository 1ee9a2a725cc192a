//! Test lifecycle driver.
//!
//! The driver walks the discovered tests one at a time and implements the
//! three lifecycle steps:
//!
//! - `build`: compile every source into its binary
//! - `run`: execute every binary and compare it against its snapshot
//! - `record`: after per-test confirmation, promote the current behaviour
//!   of a binary to its snapshot
//!
//! Snapshots are loaded once per test, the first time the test is seen, and
//! kept for the rest of the invocation. Every per-test failure is turned into
//! an [`Outcome`]; only failures to write to the console abort a batch.

use std::collections::HashMap;
use std::io::Write;

use tracing::debug;

use crate::case::TestCase;
use crate::config::CompareConfig;
use crate::confirm::Confirm;
use crate::error::Result;
use crate::report::{tags, BatchSummary, Outcome, Step};
use crate::store::{ExpectedState, ReturnCode, Store};
use crate::toolchain::{ExecutionResult, Toolchain};

/// Runs lifecycle steps against a store and a toolchain, reporting to an
/// output stream and an error stream.
pub struct Driver<T, O, E> {
    store: Store,
    toolchain: T,
    compare: CompareConfig,
    expected: HashMap<String, Result<ExpectedState>>,
    out: O,
    err: E,
}

impl<T: Toolchain, O: Write, E: Write> Driver<T, O, E> {
    pub fn new(store: Store, toolchain: T, out: O, err: E) -> Self {
        Self {
            store,
            toolchain,
            compare: CompareConfig::default(),
            expected: HashMap::new(),
            out,
            err,
        }
    }

    /// Also fail runs on the streams enabled in `compare`.
    pub fn with_compare(mut self, compare: CompareConfig) -> Self {
        self.compare = compare;
        self
    }

    /// Load (creating defaults on disk where missing) the snapshot of every
    /// case. Failures are kept and reported by each step that needs the
    /// snapshot.
    pub fn load_expectations(&mut self, cases: &[TestCase]) {
        for case in cases {
            self.expectation(case);
        }
    }

    fn expectation(&mut self, case: &TestCase) -> &Result<ExpectedState> {
        let store = &self.store;
        self.expected
            .entry(case.name().to_string())
            .or_insert_with(|| store.load(case.name()))
    }

    /// Owned copy of the snapshot, or the reason it could not be loaded.
    fn expected_state(&mut self, case: &TestCase) -> std::result::Result<ExpectedState, String> {
        match self.expectation(case) {
            Ok(state) => Ok(state.clone()),
            Err(err) => Err(err.to_string()),
        }
    }

    /// Build every case.
    pub fn build_all(&mut self, cases: &[TestCase]) -> Result<BatchSummary> {
        self.batch(Step::Build, cases, |driver, case| driver.build(case))
    }

    /// Run every case.
    pub fn run_all(&mut self, cases: &[TestCase]) -> Result<BatchSummary> {
        self.batch(Step::Run, cases, |driver, case| driver.run(case))
    }

    /// Record every case the operator confirms.
    pub fn record_all<C: Confirm + ?Sized>(
        &mut self,
        cases: &[TestCase],
        confirm: &mut C,
    ) -> Result<BatchSummary> {
        self.batch(Step::Record, cases, |driver, case| driver.record(case, confirm))
    }

    fn batch<F>(&mut self, step: Step, cases: &[TestCase], mut each: F) -> Result<BatchSummary>
    where
        F: FnMut(&mut Self, &TestCase) -> Result<Outcome>,
    {
        writeln!(self.out, "----- [{}] -----", step)?;

        let total = cases.len();
        let mut summary = BatchSummary::new(step);
        for (index, case) in cases.iter().enumerate() {
            match step {
                Step::Build => writeln!(
                    self.out,
                    "+ Building {} [{}/{}]...",
                    case.name(),
                    index + 1,
                    total
                )?,
                Step::Run => writeln!(
                    self.out,
                    "+ Running {} [{}/{}]...",
                    case.name(),
                    index + 1,
                    total
                )?,
                Step::Record => writeln!(
                    self.out,
                    "+ Recording expected behaviour for '{}'...",
                    case.name()
                )?,
            }
            let outcome = each(self, case)?;
            summary.push(case.name(), outcome);
        }

        if summary.all_passed() {
            if let Some(banner) = step.all_passed_banner() {
                writeln!(self.out, "{}", banner)?;
            }
        }
        self.out.flush()?;

        debug!(
            "{} finished: {} passed, {} failed, {} errored",
            step, summary.passed, summary.failed, summary.errored
        );
        Ok(summary)
    }

    /// Compile one case. Expectations are not touched.
    pub fn build(&mut self, case: &TestCase) -> Result<Outcome> {
        match self.toolchain.compile(case) {
            Ok(result) if result.success() => {
                self.tagged(tags::PASS, &result.stdout)?;
                Ok(Outcome::Pass)
            }
            Ok(result) => {
                self.tagged(tags::FAILED, &result.stderr)?;
                Ok(Outcome::Failed)
            }
            Err(err) => {
                writeln!(self.out, "{} {}", tags::ERROR, err)?;
                Ok(Outcome::Error)
            }
        }
    }

    /// Execute one case and compare it with its snapshot.
    pub fn run(&mut self, case: &TestCase) -> Result<Outcome> {
        let expected = match self.expected_state(case) {
            Ok(expected) => expected,
            Err(reason) => {
                writeln!(self.out, "{} {}", tags::ERROR, reason)?;
                return Ok(Outcome::Error);
            }
        };

        let actual = match self.toolchain.execute(case) {
            Ok(actual) => actual,
            Err(err) => {
                writeln!(self.out, "{} {}", tags::ERROR, err)?;
                return Ok(Outcome::Error);
            }
        };

        if expected.return_code.is_unset() {
            writeln!(
                self.out,
                "{} Test doesn't have any expected returncode!",
                tags::WARNING
            )?;
            writeln!(
                self.out,
                "{} Please record the expected behaviour of the test using the 'record' subcommand!",
                tags::WARNING
            )?;
        }

        let mismatches = self.mismatches(case, &expected, &actual);
        if mismatches.is_empty() {
            writeln!(self.out, "{}", tags::PASS)?;
            return Ok(Outcome::Pass);
        }

        writeln!(self.err, "{}", tags::FAILED)?;
        self.err.flush()?;
        for mismatch in mismatches {
            match mismatch {
                Mismatch::Stdout => {
                    self.quoted("Expected:", &expected.stdout)?;
                    self.quoted("But Got:", &actual.stdout)?;
                }
                Mismatch::Stderr => {
                    self.quoted("Expected stderr:", &expected.stderr)?;
                    self.quoted("But Got stderr:", &actual.stderr)?;
                }
                Mismatch::ReturnCode => {
                    writeln!(self.out, "Expected return code: {}", expected.return_code)?;
                    writeln!(self.out, "But Got return code: {}", actual.return_code)?;
                }
            }
        }
        Ok(Outcome::Failed)
    }

    /// Ask, then overwrite one case's snapshot with its current behaviour.
    pub fn record<C: Confirm + ?Sized>(&mut self, case: &TestCase, confirm: &mut C) -> Result<Outcome> {
        if let Err(reason) = self.expected_state(case) {
            writeln!(self.out, "{} {}", tags::ERROR, reason)?;
            return Ok(Outcome::Error);
        }
        self.out.flush()?;

        match confirm.confirm(case.name()) {
            Ok(true) => {}
            Ok(false) => {
                writeln!(self.out, "{}", tags::SKIP)?;
                return Ok(Outcome::Skipped);
            }
            Err(err) => {
                writeln!(self.out, "{} {}", tags::ERROR, err)?;
                return Ok(Outcome::Error);
            }
        }

        let state = match self.toolchain.execute(case) {
            Ok(actual) => ExpectedState::from(actual),
            Err(err) => {
                writeln!(self.out, "{} {}", tags::ERROR, err)?;
                return Ok(Outcome::Error);
            }
        };

        if let Err(err) = self.store.save(case.name(), &state) {
            writeln!(self.out, "{} {}", tags::ERROR, err)?;
            return Ok(Outcome::Error);
        }
        self.expected.insert(case.name().to_string(), Ok(state));

        writeln!(self.out, "{} Recorded expected behaviour", tags::SUCCESS)?;
        Ok(Outcome::Recorded)
    }

    fn mismatches(
        &self,
        case: &TestCase,
        expected: &ExpectedState,
        actual: &ExecutionResult,
    ) -> Vec<Mismatch> {
        let mut mismatches = Vec::new();

        if actual.stdout != expected.stdout {
            mismatches.push(Mismatch::Stdout);
        }

        if actual.stderr != expected.stderr {
            if self.compare.stderr {
                mismatches.push(Mismatch::Stderr);
            } else {
                debug!("{}: stderr differs from the recording (not enforced)", case.name());
            }
        }

        if let ReturnCode::Recorded(code) = expected.return_code {
            if code != actual.return_code {
                if self.compare.return_code {
                    mismatches.push(Mismatch::ReturnCode);
                } else {
                    debug!(
                        "{}: exited with {} but {} was recorded (not enforced)",
                        case.name(),
                        actual.return_code,
                        code
                    );
                }
            }
        }

        mismatches
    }

    fn tagged(&mut self, tag: &str, text: &[u8]) -> Result<()> {
        write!(self.out, "{}", tag)?;
        if !text.is_empty() {
            write!(self.out, " ")?;
            self.out.write_all(text)?;
        }
        writeln!(self.out)?;
        Ok(())
    }

    /// `<label> >>><bytes>>>>`, with the captured bytes written untouched.
    fn quoted(&mut self, label: &str, bytes: &[u8]) -> Result<()> {
        write!(self.out, "{} >>>", label)?;
        self.out.write_all(bytes)?;
        writeln!(self.out, ">>>")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mismatch {
    Stdout,
    Stderr,
    ReturnCode,
}

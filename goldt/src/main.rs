//! goldt CLI - golden-file regression runner.
//!
//! Parses the requested steps, initializes logging, loads configuration and
//! drives the build / run / record lifecycle over the test directory.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use goldt::case::discover;
use goldt::config::Config;
use goldt::confirm::Prompt;
use goldt::driver::Driver;
use goldt::error::{GoldtError, Result};
use goldt::report::{write_json_report, BatchSummary, Step};
use goldt::store::Store;
use goldt::toolchain::SystemToolchain;

/// Exit status for unusable arguments or configuration.
const EXIT_USAGE: u8 = 1;

/// Exit status when a build or run batch did not fully pass.
const EXIT_TESTS_FAILED: u8 = 2;

/// goldt - build, run and record golden-file tests
///
/// Every source file in the test directory is compiled into a binary next to
/// it; running a test compares the binary's stdout with the recorded
/// `<name>.out.expected` snapshot.
#[derive(Parser, Debug)]
#[command(name = "goldt")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Golden-file regression runner for compiled test programs", long_about = None)]
struct Cli {
    /// Steps to perform, in order
    #[arg(value_enum)]
    steps: Vec<StepArg>,

    /// Test directory (default: from config, else ./tests)
    #[arg(short = 'C', long = "dir", env = "GOLDT_DIR")]
    dir: Option<PathBuf>,

    /// Compiler used by the build step
    #[arg(long, env = "GOLDT_CC")]
    cc: Option<String>,

    /// Kill compilers and tests running longer than this many seconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    /// Also fail runs whose stderr differs from the recording
    #[arg(long)]
    strict_stderr: bool,

    /// Also fail runs whose exit code differs from the recording
    #[arg(long)]
    strict_code: bool,

    /// Write a JSON summary of every step to this file
    #[arg(long)]
    report: Option<PathBuf>,

    /// Path to configuration file
    #[arg(short, long, env = "GOLDT_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, env = "GOLDT_VERBOSE")]
    verbose: bool,

    /// Disable color output
    #[arg(long, env = "GOLDT_NO_COLOR")]
    no_color: bool,
}

/// Steps accepted on the command line.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum StepArg {
    /// Prints this help message
    Help,
    /// Builds all the tests
    Build,
    /// Runs all the tests
    Run,
    /// Records the expected behaviour of all the tests
    Record,
}

impl StepArg {
    fn step(self) -> Option<Step> {
        match self {
            Self::Help => None,
            Self::Build => Some(Step::Build),
            Self::Run => Some(Step::Run),
            Self::Record => Some(Step::Record),
        }
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => return parse_error(err),
    };

    if cli.steps.is_empty() {
        eprintln!("[ERROR] Please provide at least one subcommand!");
        print_help();
        return ExitCode::from(EXIT_USAGE);
    }

    match execute(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("[ERROR] {:#}", err);
            ExitCode::from(EXIT_USAGE)
        }
    }
}

/// Report a clap error the way every other goldt error is reported.
fn parse_error(err: clap::Error) -> ExitCode {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let _ = err.print();
            ExitCode::SUCCESS
        }
        _ => {
            let message = err.to_string();
            let message = message.strip_prefix("error: ").unwrap_or(&message);
            eprint!("[ERROR] {}", message);
            ExitCode::from(EXIT_USAGE)
        }
    }
}

fn print_help() {
    let _ = Cli::command().print_long_help();
}

/// Run the requested steps until the first `help`.
fn execute(cli: Cli) -> anyhow::Result<ExitCode> {
    let steps: Vec<Step> = cli.steps.iter().map_while(|arg| arg.step()).collect();
    let wants_help = steps.len() < cli.steps.len();

    if !steps.is_empty() {
        init_logging(cli.verbose, cli.no_color)?;
        let config = load_config(&cli)?;
        let batches = run_steps(&steps, &config)?;

        if let Some(path) = &cli.report {
            write_json_report(path, &batches)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
        }

        let green = batches
            .iter()
            .filter(|batch| batch.step != Step::Record)
            .all(BatchSummary::all_passed);
        if !green && !wants_help {
            return Ok(ExitCode::from(EXIT_TESTS_FAILED));
        }
    }

    if wants_help {
        print_help();
    }
    Ok(ExitCode::SUCCESS)
}

fn run_steps(steps: &[Step], config: &Config) -> anyhow::Result<Vec<BatchSummary>> {
    let root = config
        .tests_dir
        .canonicalize()
        .map_err(|cause| GoldtError::Discovery {
            path: config.tests_dir.clone(),
            cause,
        })?;
    let cases = discover(&root, &config.source_extension)?;

    let toolchain = SystemToolchain::new(config.compiler.clone(), config.timeout());
    let mut driver = Driver::new(Store::new(&root), toolchain, io::stdout(), io::stderr())
        .with_compare(config.compare);
    driver.load_expectations(&cases);
    let mut prompt = Prompt::new(io::stdin().lock(), io::stdout());

    let mut batches = Vec::with_capacity(steps.len());
    for step in steps {
        let summary = match step {
            Step::Build => driver.build_all(&cases),
            Step::Run => driver.run_all(&cases),
            Step::Record => driver.record_all(&cases, &mut prompt),
        }
        .with_context(|| format!("{} step aborted", step))?;
        batches.push(summary);
    }
    Ok(batches)
}

/// Initialize the logging system.
///
/// Logs go to stderr so that stdout only carries the test report.
fn init_logging(verbose: bool, no_color: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    let subscriber = fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(!no_color)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .try_init()
        .map_err(|e| GoldtError::Config(format!("Failed to initialize logging: {}", e)))?;

    Ok(())
}

/// Load configuration from file or defaults, then apply command-line
/// overrides.
fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match cli.config.as_deref() {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    apply_overrides(&mut config, cli);
    Ok(config)
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(dir) = &cli.dir {
        config.tests_dir = dir.clone();
    }
    if let Some(cc) = &cli.cc {
        config.compiler.program = cc.clone();
    }
    if let Some(secs) = cli.timeout {
        config.timeout_secs = Some(secs);
    }
    config.compare.stderr |= cli.strict_stderr;
    config.compare.return_code |= cli.strict_code;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_single_step() {
        let cli = Cli::parse_from(["goldt", "run"]);
        assert_eq!(cli.steps, vec![StepArg::Run]);
    }

    #[test]
    fn test_cli_parse_steps_in_order() {
        let cli = Cli::parse_from(["goldt", "build", "run"]);
        assert_eq!(cli.steps, vec![StepArg::Build, StepArg::Run]);
    }

    #[test]
    fn test_cli_parse_no_steps() {
        let cli = Cli::parse_from(["goldt"]);
        assert!(cli.steps.is_empty());
    }

    #[test]
    fn test_cli_rejects_unknown_step() {
        let err = Cli::try_parse_from(["goldt", "deploy"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn test_cli_rejects_unknown_flag() {
        let err = Cli::try_parse_from(["goldt", "-x", "run"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_cli_help_flag() {
        let err = Cli::try_parse_from(["goldt", "-h"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_parse_dir_and_cc() {
        let cli = Cli::parse_from(["goldt", "-C", "/work/tests", "--cc", "clang", "build"]);
        assert_eq!(cli.dir, Some(PathBuf::from("/work/tests")));
        assert_eq!(cli.cc, Some("clang".to_string()));
    }

    #[test]
    fn test_cli_rejects_zero_timeout() {
        assert!(Cli::try_parse_from(["goldt", "--timeout", "0", "run"]).is_err());
    }

    #[test]
    fn test_help_step_has_no_lifecycle_step() {
        assert_eq!(StepArg::Help.step(), None);
        assert_eq!(StepArg::Record.step(), Some(Step::Record));
    }

    #[test]
    fn test_overrides_win_over_config() {
        let cli = Cli::parse_from([
            "goldt",
            "--dir",
            "goldens",
            "--cc",
            "clang",
            "--timeout",
            "5",
            "--strict-code",
            "run",
        ]);
        let mut config = Config::default();
        apply_overrides(&mut config, &cli);

        assert_eq!(config.tests_dir, PathBuf::from("goldens"));
        assert_eq!(config.compiler.program, "clang");
        assert_eq!(config.timeout_secs, Some(5));
        assert!(config.compare.return_code);
        assert!(!config.compare.stderr);
    }

    #[test]
    fn test_overrides_keep_config_when_absent() {
        let cli = Cli::parse_from(["goldt", "run"]);
        let mut config = Config::default();
        config.compare.stderr = true;
        apply_overrides(&mut config, &cli);

        assert_eq!(config, {
            let mut expected = Config::default();
            expected.compare.stderr = true;
            expected
        });
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }
}

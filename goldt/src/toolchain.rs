//! External collaborators: the compiler and the built test binaries.
//!
//! Both are plain child processes whose stdout, stderr and exit code are
//! captured into an [`ExecutionResult`]. The [`Toolchain`] trait is the seam
//! the lifecycle driver talks to.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::case::TestCase;
use crate::config::CompilerConfig;
use crate::error::{GoldtError, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Captured result of one process invocation.
///
/// Streams are kept as raw bytes; test programs are free to print anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub return_code: i32,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.return_code == 0
    }

    fn from_output(output: Output) -> Self {
        Self {
            stdout: output.stdout,
            stderr: output.stderr,
            return_code: exit_code(output.status),
        }
    }
}

/// Builds and executes test cases.
#[cfg_attr(test, mockall::automock)]
pub trait Toolchain {
    /// Compile the case's source into its binary.
    fn compile(&self, case: &TestCase) -> Result<ExecutionResult>;

    /// Execute the case's binary with no arguments.
    fn execute(&self, case: &TestCase) -> Result<ExecutionResult>;
}

/// [`Toolchain`] backed by real processes.
#[derive(Debug, Clone)]
pub struct SystemToolchain {
    compiler: CompilerConfig,
    timeout: Option<Duration>,
}

impl SystemToolchain {
    pub fn new(compiler: CompilerConfig, timeout: Option<Duration>) -> Self {
        Self { compiler, timeout }
    }

    fn capture(&self, mut command: Command, program: String) -> Result<ExecutionResult> {
        command.stdout(Stdio::piped()).stderr(Stdio::piped());
        debug!("Spawning {:?}", command);

        let child = command.spawn().map_err(|cause| GoldtError::Launch {
            program: program.clone(),
            cause,
        })?;

        let output = match self.timeout {
            Some(limit) => wait_with_timeout(child, limit, &program)?,
            None => child
                .wait_with_output()
                .map_err(|cause| GoldtError::Launch { program, cause })?,
        };

        Ok(ExecutionResult::from_output(output))
    }
}

impl Toolchain for SystemToolchain {
    fn compile(&self, case: &TestCase) -> Result<ExecutionResult> {
        let binary = absolute(&case.binary_path())?;
        let source = absolute(&case.source_path())?;

        let mut command = Command::new(&self.compiler.program);
        command
            .args(&self.compiler.flags)
            .arg("-o")
            .arg(binary)
            .arg(source)
            .current_dir(case.root())
            .stdin(Stdio::null());

        self.capture(command, self.compiler.program.clone())
    }

    fn execute(&self, case: &TestCase) -> Result<ExecutionResult> {
        let binary = absolute(&case.binary_path())?;
        let program = format!("./{}", case.name());

        let input_path = case.input_path();
        let stdin = if input_path.is_file() {
            let file = std::fs::File::open(&input_path).map_err(|cause| GoldtError::Launch {
                program: program.clone(),
                cause,
            })?;
            debug!("Feeding {} to {}", input_path.display(), program);
            Stdio::from(file)
        } else {
            Stdio::null()
        };

        let mut command = Command::new(binary);
        command.current_dir(case.root()).stdin(stdin);

        self.capture(command, program)
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    Ok(std::path::absolute(path)?)
}

/// Exit code of a finished process; signals map to `128 + signal`.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buf)?;
        }
        Ok(buf)
    })
}

fn collect(reader: thread::JoinHandle<io::Result<Vec<u8>>>) -> io::Result<Vec<u8>> {
    reader
        .join()
        .unwrap_or_else(|_| Err(io::Error::other("output reader panicked")))
}

fn wait_with_timeout(mut child: Child, limit: Duration, program: &str) -> Result<Output> {
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());
    let launch = |cause: io::Error| GoldtError::Launch {
        program: program.to_string(),
        cause,
    };

    let start = Instant::now();
    let status = loop {
        if let Some(status) = child.try_wait().map_err(launch)? {
            break status;
        }
        if start.elapsed() >= limit {
            let _ = child.kill();
            let _ = child.wait();
            warn!("Killed {} after {:?}", program, limit);
            return Err(GoldtError::Timeout {
                program: program.to_string(),
                secs: limit.as_secs(),
            });
        }
        thread::sleep(POLL_INTERVAL);
    };

    Ok(Output {
        status,
        stdout: collect(stdout).map_err(launch)?,
        stderr: collect(stderr).map_err(launch)?,
    })
}

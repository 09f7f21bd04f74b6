//! Invocation of the external converter and test runner.

use std::{
    ffi::OsString,
    fmt, io,
    path::PathBuf,
    process::{Child, Command, ExitStatus, Stdio},
    thread,
    time::{Duration, Instant},
};

use derive_more::Display;

/// Which external tool a test definition is currently waiting on.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display)]
pub enum Step {
    #[display("conversion")]
    Convert,
    #[display("execution")]
    Execute,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub step: Step,
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl Invocation {
    pub fn new(step: Step, program: impl Into<PathBuf>) -> Self {
        Self {
            step,
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn program_name(&self) -> String {
        self.program.display().to_string()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// How a tool process ended. `code` is `None` when it was terminated by a signal.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Completion {
    pub code: Option<i32>,
}

impl Completion {
    pub const SUCCESS: Completion = Completion { code: Some(0) };

    pub fn exited(code: i32) -> Self {
        Self { code: Some(code) }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<ExitStatus> for Completion {
    fn from(status: ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }
}

impl fmt::Display for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit status {code}"),
            None => write!(f, "terminated by signal"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("failed waiting for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{program} did not finish within {after:?}")]
    TimedOut { program: String, after: Duration },
}

/// Runs one tool invocation to completion.
pub trait ToolExecutor {
    fn invoke(&self, invocation: &Invocation) -> Result<Completion, ToolError>;
}

/// Spawns real child processes.
///
/// The child's stdout is sent to our stderr, keeping stdout for the report.
#[derive(Clone, Debug)]
pub struct ProcessExecutor {
    pub timeout: Option<Duration>,
    pub poll_interval: Duration,
}

impl Default for ProcessExecutor {
    fn default() -> Self {
        Self {
            timeout: None,
            poll_interval: Duration::from_millis(10),
        }
    }
}

impl ProcessExecutor {
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            ..Default::default()
        }
    }

    fn wait(&self, child: &mut Child, program: &str) -> Result<Completion, ToolError> {
        let wait_err = |source| ToolError::Wait {
            program: program.to_string(),
            source,
        };

        let Some(timeout) = self.timeout else {
            return child.wait().map(Completion::from).map_err(wait_err);
        };

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = child.try_wait().map_err(wait_err)? {
                return Ok(status.into());
            }
            if Instant::now() >= deadline {
                // The child may have exited between the poll and the kill.
                let _ = child.kill();
                let _ = child.wait();
                return Err(ToolError::TimedOut {
                    program: program.to_string(),
                    after: timeout,
                });
            }
            thread::sleep(self.poll_interval);
        }
    }
}

impl ToolExecutor for ProcessExecutor {
    fn invoke(&self, invocation: &Invocation) -> Result<Completion, ToolError> {
        let program = invocation.program_name();
        tracing::debug!(step = %invocation.step, command = %invocation, "spawning tool");

        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(io::stderr()))
            .spawn()
            .map_err(|source| ToolError::Spawn {
                program: program.clone(),
                source,
            })?;

        let completion = self.wait(&mut child, &program)?;
        tracing::debug!(step = %invocation.step, %completion, "tool finished");
        Ok(completion)
    }
}

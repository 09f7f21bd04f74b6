//! Drives every test definition through conversion and execution.
//!
//! Each definition moves `Discovered -> Converted -> Executed` and ends either
//! `Succeeded` or `Failed`. A failure is recorded and the run moves on to the
//! next definition; nothing a single definition does can abort the run.

use std::{
    ffi::OsString,
    fmt,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    config::HarnessConfig,
    discovery::discover,
    report::RunReport,
    tool::{Completion, Invocation, ProcessExecutor, Step, ToolError, ToolExecutor},
    HarnessError,
};

/// Why a test definition failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FailureCause {
    /// The converter ran and exited unsuccessfully; execution was not attempted.
    ConversionFailed { tool: String, completion: Completion },
    /// The runner ran and exited unsuccessfully.
    RunnerFailed { tool: String, completion: Completion },
    TimedOut { step: Step, tool: String, after: Duration },
    /// Anything else that went wrong while handling a tool, such as a missing executable.
    Unclassified { step: Step, message: String },
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCause::ConversionFailed { tool, completion } => {
                write!(f, "conversion failed: {tool} returned {completion}")
            }
            FailureCause::RunnerFailed { tool, completion } => {
                write!(f, "test run failed: {tool} returned {completion}")
            }
            FailureCause::TimedOut { step, tool, after } => {
                write!(f, "{step} timed out: {tool} still running after {after:?}")
            }
            FailureCause::Unclassified { step, message } => write!(f, "{step} error: {message}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed(FailureCause),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Succeeded)
    }
}

/// Terminal state of one test definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestRecord {
    pub path: PathBuf,
    pub artifact: PathBuf,
    pub outcome: Outcome,
}

pub struct Harness<E = ProcessExecutor> {
    config: HarnessConfig,
    executor: E,
}

impl Harness<ProcessExecutor> {
    pub fn new(config: HarnessConfig) -> Self {
        let executor = ProcessExecutor::with_timeout(config.timeout);
        Self { config, executor }
    }
}

impl<E: ToolExecutor> Harness<E> {
    pub fn with_executor(config: HarnessConfig, executor: E) -> Self {
        Self { config, executor }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Discovers the test definitions in `dir`, runs them all and aggregates the outcomes.
    pub fn run_dir(&self, dir: &Path) -> Result<RunReport, HarnessError> {
        let paths = discover(dir, &self.config.suffix).map_err(|source| HarnessError::Discovery {
            dir: dir.to_path_buf(),
            source,
        })?;
        tracing::info!(dir = %dir.display(), count = paths.len(), "discovered test definitions");

        let records = self.run_all(&paths);
        Ok(RunReport::from_records(&records))
    }

    pub fn run_all(&self, paths: &[PathBuf]) -> Vec<TestRecord> {
        paths.iter().map(|path| self.run_one(path)).collect()
    }

    pub fn run_one(&self, path: &Path) -> TestRecord {
        let artifact = self.artifact_path(path);
        let outcome = match self.convert(path, &artifact).and_then(|()| self.execute(&artifact)) {
            Ok(()) => {
                tracing::info!(test = %path.display(), "succeeded");
                Outcome::Succeeded
            }
            Err(cause) => {
                tracing::warn!(test = %path.display(), %cause, "failed");
                Outcome::Failed(cause)
            }
        };

        TestRecord {
            path: path.to_path_buf(),
            artifact,
            outcome,
        }
    }

    /// `a.wast` converts to `a.wast.json`, next to its source.
    pub fn artifact_path(&self, path: &Path) -> PathBuf {
        let mut artifact = OsString::from(path.as_os_str());
        artifact.push(&self.config.artifact_suffix);
        PathBuf::from(artifact)
    }

    fn convert(&self, path: &Path, artifact: &Path) -> Result<(), FailureCause> {
        let invocation = Invocation::new(Step::Convert, &self.config.converter)
            .arg(path)
            .arg("-o")
            .arg(artifact);
        let completion = self.invoke_with_retries(&invocation)?;
        if !completion.success() {
            return Err(FailureCause::ConversionFailed {
                tool: invocation.program_name(),
                completion,
            });
        }
        tracing::debug!(test = %path.display(), artifact = %artifact.display(), "converted");
        Ok(())
    }

    fn execute(&self, artifact: &Path) -> Result<(), FailureCause> {
        let invocation = Invocation::new(Step::Execute, &self.config.runner).arg(artifact);
        let completion = self.invoke_with_retries(&invocation)?;
        if !completion.success() {
            return Err(FailureCause::RunnerFailed {
                tool: invocation.program_name(),
                completion,
            });
        }
        tracing::debug!(artifact = %artifact.display(), "executed");
        Ok(())
    }

    /// Runs one step, repeating it up to `retries` more times while it keeps failing.
    /// Returns the last completion, successful or not.
    fn invoke_with_retries(&self, invocation: &Invocation) -> Result<Completion, FailureCause> {
        let attempts = self.config.retries.saturating_add(1);
        let mut attempt = 1;
        loop {
            let result = self.executor.invoke(invocation);
            let done = matches!(&result, Ok(completion) if completion.success());
            if done || attempt >= attempts {
                return result.map_err(|err| classify(invocation.step, err));
            }
            match &result {
                Ok(completion) => {
                    tracing::warn!(command = %invocation, %completion, attempt, "retrying")
                }
                Err(err) => tracing::warn!(command = %invocation, %err, attempt, "retrying"),
            }
            attempt += 1;
        }
    }
}

fn classify(step: Step, err: ToolError) -> FailureCause {
    match err {
        ToolError::TimedOut { program, after } => FailureCause::TimedOut {
            step,
            tool: program,
            after,
        },
        other => FailureCause::Unclassified {
            step,
            message: other.to_string(),
        },
    }
}

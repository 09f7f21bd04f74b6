//! Conformance harness for the WebAssembly spec test suite.
//!
//! Test definitions (`.wast`) found in a directory are converted with an
//! external converter and the converted artifacts are run by an external test
//! runner. Both tools are black boxes: only their exit status matters.

use std::{io, path::PathBuf};

pub mod config;
pub mod discovery;
pub mod harness;
pub mod report;
pub mod tool;

#[cfg(test)]
mod tests;

pub use config::HarnessConfig;
pub use harness::{FailureCause, Harness, Outcome, TestRecord};
pub use report::RunReport;
pub use tool::{Completion, Invocation, ProcessExecutor, Step, ToolError, ToolExecutor};

#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("cannot scan {}: {source}", dir.display())]
    Discovery {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },
}

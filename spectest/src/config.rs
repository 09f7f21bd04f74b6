use std::{path::PathBuf, time::Duration};

/// Settings for one harness run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HarnessConfig {
    /// File-name suffix of test definitions.
    pub suffix: String,
    /// Appended to a test definition's path to name its converted artifact.
    pub artifact_suffix: String,
    pub converter: PathBuf,
    pub runner: PathBuf,
    /// Per invocation; `None` waits forever.
    pub timeout: Option<Duration>,
    /// Extra attempts per step after a failed one.
    pub retries: u32,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            suffix: ".wast".to_string(),
            artifact_suffix: ".json".to_string(),
            converter: PathBuf::from("wast2json"),
            runner: PathBuf::from("./test_runner"),
            timeout: Some(Duration::from_secs(600)),
            retries: 0,
        }
    }
}

impl HarnessConfig {
    pub fn with_converter(mut self, converter: impl Into<PathBuf>) -> Self {
        self.converter = converter.into();
        self
    }

    pub fn with_runner(mut self, runner: impl Into<PathBuf>) -> Self {
        self.runner = runner.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }
}

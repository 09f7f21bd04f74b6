use std::{fmt, path::PathBuf};

use serde::Serialize;

use crate::harness::{Outcome, TestRecord};

/// Aggregated result of one harness run, in discovery order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub successes: Vec<PathBuf>,
    pub failures: Vec<PathBuf>,
    pub num_successes: usize,
    pub num_failures: usize,
}

impl RunReport {
    pub fn from_records(records: &[TestRecord]) -> Self {
        let (successes, failures): (Vec<_>, Vec<_>) = records
            .iter()
            .partition(|record| record.outcome == Outcome::Succeeded);
        let successes: Vec<PathBuf> = successes.into_iter().map(|r| r.path.clone()).collect();
        let failures: Vec<PathBuf> = failures.into_iter().map(|r| r.path.clone()).collect();

        Self {
            num_successes: successes.len(),
            num_failures: failures.len(),
            successes,
            failures,
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "{} successes, {} failures",
            self.num_successes, self.num_failures
        )
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Successes:")?;
        for path in &self.successes {
            writeln!(f, "{}", path.display())?;
        }
        writeln!(f, "Failures:")?;
        for path in &self.failures {
            writeln!(f, "{}", path.display())?;
        }
        write!(f, "{}", self.summary())
    }
}

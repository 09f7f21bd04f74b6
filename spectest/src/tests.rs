use std::{
    cell::RefCell,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use tempfile::{tempdir, TempDir};

use crate::{
    Completion, FailureCause, Harness, HarnessConfig, HarnessError, Invocation, Outcome, Step,
    ToolError, ToolExecutor,
};

type Script = Box<dyn Fn(&Invocation, usize) -> Result<Completion, ToolError>>;

/// Answers every invocation from a closure and remembers what was asked.
struct FakeTools {
    script: Script,
    calls: RefCell<Vec<Invocation>>,
}

impl FakeTools {
    fn new(script: impl Fn(&Invocation, usize) -> Result<Completion, ToolError> + 'static) -> Self {
        Self {
            script: Box::new(script),
            calls: RefCell::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }
}

impl ToolExecutor for FakeTools {
    fn invoke(&self, invocation: &Invocation) -> Result<Completion, ToolError> {
        let previous = self
            .calls
            .borrow()
            .iter()
            .filter(|call| *call == invocation)
            .count();
        self.calls.borrow_mut().push(invocation.clone());
        (self.script)(invocation, previous)
    }
}

fn first_arg(invocation: &Invocation) -> String {
    invocation
        .args
        .first()
        .map(|arg| arg.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn wast_dir(names: &[&str]) -> TempDir {
    let dir = tempdir().unwrap();
    for name in names {
        fs::write(dir.path().join(name), "(module)").unwrap();
    }
    dir
}

fn file_names(paths: &[PathBuf]) -> Vec<&str> {
    paths
        .iter()
        .map(|p| p.file_name().unwrap().to_str().unwrap())
        .collect()
}

#[test]
fn conversion_failure_skips_execution() {
    let dir = wast_dir(&["b.wast", "a.wast"]);
    let tools = FakeTools::new(|inv, _| match inv.step {
        Step::Convert if first_arg(inv).ends_with("b.wast") => Ok(Completion::exited(1)),
        _ => Ok(Completion::SUCCESS),
    });
    let harness = Harness::with_executor(HarnessConfig::default(), tools);

    let report = harness.run_dir(dir.path()).unwrap();
    assert_eq!(file_names(&report.successes), ["a.wast"]);
    assert_eq!(file_names(&report.failures), ["b.wast"]);
    assert!(report.to_string().ends_with("\n1 successes, 1 failures"));

    let calls = harness_calls(&harness);
    let steps: Vec<_> = calls.iter().map(|c| (c.step, first_arg(c))).collect();
    let a = dir.path().join("a.wast").display().to_string();
    let b = dir.path().join("b.wast").display().to_string();
    assert_eq!(
        steps,
        [
            (Step::Convert, a.clone()),
            (Step::Execute, format!("{a}.json")),
            (Step::Convert, b),
        ]
    );
    assert_eq!(calls[0].program, PathBuf::from("wast2json"));
    assert_eq!(calls[0].args[1], "-o");
    assert_eq!(calls[1].program, PathBuf::from("./test_runner"));
}

fn harness_calls(harness: &Harness<FakeTools>) -> Vec<Invocation> {
    harness.executor().calls()
}

#[test]
fn empty_directory_reports_nothing() {
    let dir = wast_dir(&[]);
    let harness = Harness::with_executor(
        HarnessConfig::default(),
        FakeTools::new(|_, _| panic!("no tool should run")),
    );
    let report = harness.run_dir(dir.path()).unwrap();
    assert!(report.successes.is_empty());
    assert!(report.failures.is_empty());
    assert_eq!(
        report.to_string(),
        "Successes:\nFailures:\n0 successes, 0 failures"
    );
}

#[test]
fn runner_failure_is_recorded() {
    let tools = FakeTools::new(|inv, _| match inv.step {
        Step::Convert => Ok(Completion::SUCCESS),
        Step::Execute => Ok(Completion::exited(2)),
    });
    let harness = Harness::with_executor(HarnessConfig::default(), tools);
    let record = harness.run_one(Path::new("i32.wast"));
    assert_eq!(record.artifact, PathBuf::from("i32.wast.json"));
    assert_eq!(
        record.outcome,
        Outcome::Failed(FailureCause::RunnerFailed {
            tool: "./test_runner".to_string(),
            completion: Completion::exited(2),
        })
    );
}

#[test]
fn tool_errors_do_not_stop_the_run() {
    let tools = FakeTools::new(|inv, _| {
        if first_arg(inv) == "broken.wast" {
            Err(ToolError::Spawn {
                program: "wast2json".to_string(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
        } else if first_arg(inv) == "slow.wast.json" {
            Err(ToolError::TimedOut {
                program: "./test_runner".to_string(),
                after: Duration::from_secs(600),
            })
        } else {
            Ok(Completion::SUCCESS)
        }
    });
    let harness = Harness::with_executor(HarnessConfig::default(), tools);
    let paths: Vec<PathBuf> = ["broken.wast", "fine.wast", "slow.wast"]
        .into_iter()
        .map(PathBuf::from)
        .collect();
    let records = harness.run_all(&paths);

    assert!(matches!(
        &records[0].outcome,
        Outcome::Failed(FailureCause::Unclassified {
            step: Step::Convert,
            ..
        })
    ));
    assert!(records[1].outcome.is_success());
    assert_eq!(
        records[2].outcome,
        Outcome::Failed(FailureCause::TimedOut {
            step: Step::Execute,
            tool: "./test_runner".to_string(),
            after: Duration::from_secs(600),
        })
    );
}

#[test]
fn failed_steps_are_retried_without_rescanning() {
    // The converter fails on its first attempt for every file.
    let tools = FakeTools::new(|inv, previous| match (inv.step, previous) {
        (Step::Convert, 0) => Ok(Completion::exited(1)),
        _ => Ok(Completion::SUCCESS),
    });
    let config = HarnessConfig::default().with_retries(1);
    let harness = Harness::with_executor(config, tools);

    let record = harness.run_one(Path::new("i32.wast"));
    assert!(record.outcome.is_success());
    let steps: Vec<_> = harness_calls(&harness).iter().map(|c| c.step).collect();
    assert_eq!(steps, [Step::Convert, Step::Convert, Step::Execute]);
}

#[test]
fn retries_give_up_with_the_last_result() {
    let tools = FakeTools::new(|_, _| Ok(Completion::exited(3)));
    let harness = Harness::with_executor(HarnessConfig::default().with_retries(2), tools);

    let record = harness.run_one(Path::new("i32.wast"));
    assert_eq!(
        record.outcome,
        Outcome::Failed(FailureCause::ConversionFailed {
            tool: "wast2json".to_string(),
            completion: Completion::exited(3),
        })
    );
    assert_eq!(harness_calls(&harness).len(), 3);
}

#[test]
fn unreadable_directory_is_a_harness_error() {
    let dir = tempdir().unwrap();
    let tools = FakeTools::new(|_, _| unreachable!());
    let harness = Harness::with_executor(HarnessConfig::default(), tools);
    let err = harness.run_dir(&dir.path().join("missing")).unwrap_err();
    assert!(matches!(err, HarnessError::Discovery { .. }));
}

#[cfg(unix)]
mod processes {
    use std::os::unix::fs::PermissionsExt;

    use super::*;

    fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// Converter copies its input to the `-o` path and refuses files named `b.wast`;
    /// the runner accepts any artifact that exists.
    fn fake_toolchain(tools: &Path) -> HarnessConfig {
        let converter = script(
            tools,
            "wast2json",
            r#"case "$1" in *b.wast) exit 1;; esac
[ "$2" = "-o" ] || exit 64
cp "$1" "$3""#,
        );
        let runner = script(tools, "test_runner", r#"test -f "$1""#);
        HarnessConfig::default()
            .with_converter(converter)
            .with_runner(runner)
            .with_timeout(Some(Duration::from_secs(30)))
            // Absorbs the occasional ETXTBSY from exec'ing a freshly written script.
            .with_retries(2)
    }

    #[test]
    fn real_processes_end_to_end() {
        let tools = tempdir().unwrap();
        let suite = wast_dir(&["a.wast", "b.wast"]);
        let harness = Harness::new(fake_toolchain(tools.path()));

        let report = harness.run_dir(suite.path()).unwrap();
        assert_eq!(file_names(&report.successes), ["a.wast"]);
        assert_eq!(file_names(&report.failures), ["b.wast"]);
        assert_eq!(report.summary(), "1 successes, 1 failures");

        // Converted artifacts are left behind.
        assert!(suite.path().join("a.wast.json").is_file());

        // A second run ignores the artifacts of the first.
        let again = harness.run_dir(suite.path()).unwrap();
        assert_eq!(again, report);
    }

    #[test]
    fn hung_runner_times_out() {
        let tools = tempdir().unwrap();
        let suite = wast_dir(&["loop.wast"]);
        let runner = script(tools.path(), "hang", "sleep 10");
        let config = fake_toolchain(tools.path())
            .with_runner(runner)
            .with_timeout(Some(Duration::from_millis(200)));

        let report = Harness::new(config).run_dir(suite.path()).unwrap();
        assert_eq!(file_names(&report.failures), ["loop.wast"]);
    }

    #[test]
    fn missing_runner_is_a_failure_not_an_error() {
        let tools = tempdir().unwrap();
        let suite = wast_dir(&["a.wast"]);
        let config = fake_toolchain(tools.path()).with_runner(tools.path().join("absent"));

        let report = Harness::new(config).run_dir(suite.path()).unwrap();
        assert_eq!(report.summary(), "0 successes, 1 failures");
    }
}

//! External command execution

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Mutex;
use tokio::process::Command;
use xsdeps_errors::Error;

/// A fully described external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    /// Variables set on top of the inherited process environment
    pub env: BTreeMap<String, String>,
}

impl Invocation {
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            env: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn envs(mut self, env: &BTreeMap<String, String>) -> Self {
        self.env
            .extend(env.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// How a finished process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitReport {
    /// `None` when terminated by a signal
    pub code: Option<i32>,
}

impl ExitReport {
    #[must_use]
    pub fn success(self) -> bool {
        self.code == Some(0)
    }
}

impl fmt::Display for ExitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit status {code}"),
            None => f.write_str("terminated by signal"),
        }
    }
}

/// Captured result of a command run for its output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedOutput {
    pub status: ExitReport,
    pub stdout: String,
    pub stderr: String,
}

/// Seam between the orchestrator and the operating system
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run with inherited stdio
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned.
    async fn run(&self, invocation: &Invocation) -> Result<ExitReport, Error>;

    /// Run and capture standard output and error
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned.
    async fn capture(&self, invocation: &Invocation) -> Result<CapturedOutput, Error>;
}

/// Runs commands as child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    fn command(invocation: &Invocation) -> Command {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args).envs(&invocation.env);
        if let Some(dir) = &invocation.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }

    fn spawn_error(invocation: &Invocation, err: &std::io::Error) -> Error {
        Error::Io {
            kind: err.kind(),
            message: format!("failed to run {}: {err}", invocation.program),
            path: invocation.working_dir.clone(),
        }
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, invocation: &Invocation) -> Result<ExitReport, Error> {
        let status = Self::command(invocation)
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|e| Self::spawn_error(invocation, &e))?;
        Ok(ExitReport {
            code: status.code(),
        })
    }

    async fn capture(&self, invocation: &Invocation) -> Result<CapturedOutput, Error> {
        let output = Self::command(invocation)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| Self::spawn_error(invocation, &e))?;
        Ok(CapturedOutput {
            status: ExitReport {
                code: output.status.code(),
            },
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

type Matcher = Box<dyn Fn(&Invocation) -> bool + Send + Sync>;

/// Test double that records invocations instead of running them
///
/// Every invocation succeeds with empty output unless it matches the failure
/// predicate or a canned response.
#[derive(Default)]
pub struct RecordingRunner {
    log: Mutex<Vec<Invocation>>,
    fail_when: Option<Matcher>,
    unspawnable: Vec<String>,
    responses: Vec<(String, CapturedOutput)>,
}

impl RecordingRunner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Exit with status 1 for invocations matching `predicate`
    #[must_use]
    pub fn failing_when(
        mut self,
        predicate: impl Fn(&Invocation) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.fail_when = Some(Box::new(predicate));
        self
    }

    /// Behave as if `program` is not installed
    #[must_use]
    pub fn without_program(mut self, program: impl Into<String>) -> Self {
        self.unspawnable.push(program.into());
        self
    }

    /// Canned output for captured runs of `program`
    #[must_use]
    pub fn responding(mut self, program: impl Into<String>, output: CapturedOutput) -> Self {
        self.responses.push((program.into(), output));
        self
    }

    /// Everything run so far, in order
    #[must_use]
    pub fn invocations(&self) -> Vec<Invocation> {
        self.log
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    fn record(&self, invocation: &Invocation) -> Result<ExitReport, Error> {
        if let Ok(mut log) = self.log.lock() {
            log.push(invocation.clone());
        }
        if self.unspawnable.contains(&invocation.program) {
            return Err(Error::Io {
                kind: std::io::ErrorKind::NotFound,
                message: format!("failed to run {}: not found", invocation.program),
                path: None,
            });
        }
        let failed = self.fail_when.as_ref().is_some_and(|f| f(invocation));
        Ok(ExitReport {
            code: Some(i32::from(failed)),
        })
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, invocation: &Invocation) -> Result<ExitReport, Error> {
        self.record(invocation)
    }

    async fn capture(&self, invocation: &Invocation) -> Result<CapturedOutput, Error> {
        let status = self.record(invocation)?;
        if let Some((_, output)) = self
            .responses
            .iter()
            .find(|(program, _)| *program == invocation.program)
        {
            return Ok(output.clone());
        }
        Ok(CapturedOutput {
            status,
            stdout: String::new(),
            stderr: String::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_display() {
        let inv = Invocation::new("make").args(["-j5", "install"]);
        assert_eq!(inv.to_string(), "make -j5 install");
    }

    #[tokio::test]
    async fn test_recording_runner_fails_on_match() {
        let runner =
            RecordingRunner::new().failing_when(|inv| inv.args.contains(&"install".into()));
        let ok = runner.run(&Invocation::new("make")).await.unwrap();
        let bad = runner
            .run(&Invocation::new("make").arg("install"))
            .await
            .unwrap();
        assert!(ok.success());
        assert!(!bad.success());
        assert_eq!(runner.invocations().len(), 2);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_runner_reports_exit_code() {
        let runner = ProcessRunner;
        let report = runner
            .run(&Invocation::new("sh").args(["-c", "exit 3"]))
            .await
            .unwrap();
        assert_eq!(report.code, Some(3));

        let output = runner
            .capture(&Invocation::new("sh").args(["-c", "echo $XSDEPS_PROBE"]).envs(
                &BTreeMap::from([("XSDEPS_PROBE".to_string(), "hello".to_string())]),
            ))
            .await
            .unwrap();
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let result = ProcessRunner
            .run(&Invocation::new("xsdeps-definitely-not-a-program"))
            .await;
        assert!(result.is_err());
    }
}

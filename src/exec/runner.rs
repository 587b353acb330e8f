use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use crate::errors::FixcheckError;
use crate::utils::truncate_chars;
use tracing::debug;

/// A fully described external process invocation. The working directory is always
/// explicit so nothing depends on the process-wide current directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub env: Vec<(String, String)>,
    pub timeout: Duration,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, cwd: &Path, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.to_path_buf(),
            env: Vec::new(),
            timeout,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Program and arguments joined for display.
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// None when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn ok(stdout: impl Into<String>) -> Self {
        Self { exit_code: Some(0), stdout: stdout.into(), stderr: String::new() }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self { exit_code: Some(code), stdout: String::new(), stderr: stderr.into() }
    }
}

/// Seam through which every external process is spawned.
///
/// Returns `Err(FixcheckError::Timeout)` when the deadline passes and
/// `Err(FixcheckError::Process)` when the program cannot be started. A process that
/// runs and exits non-zero is still `Ok`.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, FixcheckError>;
}

/// Runs commands as real child processes.
#[derive(Debug, Default, Clone)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, FixcheckError> {
        let shown = spec.display();
        debug!(command = %truncate_chars(&shown, 200), cwd = %spec.cwd.display(), "Spawning process");

        let mut command = tokio::process::Command::new(&spec.program);
        command
            .args(&spec.args)
            .current_dir(&spec.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for (key, value) in &spec.env {
            command.env(key, value);
        }

        let child = command.spawn().map_err(|e| {
            FixcheckError::Process(format!("Failed to start '{}': {}", spec.program, e))
        })?;

        let output = tokio::time::timeout(spec.timeout, child.wait_with_output())
            .await
            .map_err(|_| FixcheckError::Timeout(format!(
                "Command timed out after {}s: {}",
                spec.timeout.as_secs(),
                truncate_chars(&shown, 100)
            )))?
            .map_err(|e| FixcheckError::Process(format!("Failed to collect output of '{}': {}", spec.program, e)))?;

        Ok(CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_builder() {
        let spec = CommandSpec::new("python", Path::new("/tmp/sb"), Duration::from_secs(10))
            .args(["-m", "py_compile"])
            .arg("app.py")
            .env("PYTHONDONTWRITEBYTECODE", "1");
        assert_eq!(spec.display(), "python -m py_compile app.py");
        assert_eq!(spec.cwd, PathBuf::from("/tmp/sb"));
        assert_eq!(spec.env.len(), 1);
    }

    #[test]
    fn test_output_success() {
        assert!(CommandOutput::ok("fine").success());
        assert!(!CommandOutput::failed(1, "boom").success());
        assert!(!CommandOutput::default().success());
    }

    #[tokio::test]
    async fn test_missing_program_is_process_error() {
        let dir = std::env::temp_dir();
        let spec = CommandSpec::new("fixcheck-no-such-binary-7f3a", &dir, Duration::from_secs(5));
        let err = SystemRunner.run(&spec).await.unwrap_err();
        assert!(matches!(err, FixcheckError::Process(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_is_reported() {
        let dir = std::env::temp_dir();
        let spec = CommandSpec::new("sleep", &dir, Duration::from_millis(200)).arg("5");
        let err = SystemRunner.run(&spec).await.unwrap_err();
        assert!(matches!(err, FixcheckError::Timeout(_)));
        assert!(err.to_string().contains("sleep 5"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_runs_in_given_directory() {
        let dir = tempfile::tempdir().unwrap();
        let spec = CommandSpec::new("pwd", dir.path(), Duration::from_secs(5));
        let output = SystemRunner.run(&spec).await.unwrap();
        assert!(output.success());
        let reported = std::path::PathBuf::from(output.stdout.trim());
        assert_eq!(reported.canonicalize().unwrap(), dir.path().canonicalize().unwrap());
    }
}

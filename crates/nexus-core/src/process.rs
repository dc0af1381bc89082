//! External process execution
//!
//! Every probe, build and CI call goes through a [`CommandRunner`] so stages
//! can be exercised against scripted runners in tests.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::error::{NexusError, Result};

/// A fully specified process invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    /// Variables added on top of the inherited environment
    pub env: BTreeMap<String, String>,
    /// Kill the process and fail with `BuildTimeout` after this long
    pub timeout: Option<Duration>,
}

impl Invocation {
    pub fn new(program: impl Into<String>, cwd: &Path) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.to_path_buf(),
            env: BTreeMap::new(),
            timeout: None,
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
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn envs(mut self, vars: &BTreeMap<String, String>) -> Self {
        self.env
            .extend(vars.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Shell-like rendering used in logs and error messages
    pub fn command_line(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when terminated by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Some(0)
    }

    /// Turn a non-zero exit into [`NexusError::CommandFailed`]
    pub fn into_result(self, invocation: &Invocation) -> Result<CommandOutput> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(NexusError::CommandFailed {
                command: invocation.command_line(),
                exit_code: self.status,
                stdout: self.stdout,
                stderr: self.stderr,
            })
        }
    }
}

/// Spawns external processes
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run to completion. Fails only when the process cannot be spawned or
    /// exceeds its timeout; a non-zero exit is reported in the output.
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput>;

    /// Run and require a zero exit status
    async fn run_checked(&self, invocation: &Invocation) -> Result<CommandOutput> {
        self.run(invocation).await?.into_result(invocation)
    }
}

/// [`CommandRunner`] backed by `tokio::process`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    #[instrument(skip(self), fields(command = %invocation.command_line(), cwd = %invocation.cwd.display()))]
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        let child = tokio::process::Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .envs(&invocation.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| NexusError::Spawn {
                command: invocation.program.clone(),
                source,
            })?;

        let output = match invocation.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| NexusError::build_timeout(&invocation.command_line(), limit.as_secs()))?,
            None => child.wait_with_output().await,
        }?;

        let result = CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!(status = ?result.status, "process finished");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_command_line() {
        let inv = Invocation::new("taro", Path::new("."))
            .args(["build", "--type", "weapp"]);
        assert_eq!(inv.command_line(), "taro build --type weapp");
        assert_eq!(Invocation::new("uni", Path::new(".")).command_line(), "uni");
    }

    #[test]
    fn test_into_result() {
        let inv = Invocation::new("npm", Path::new(".")).arg("run");
        assert!(CommandOutput::success("ok").into_result(&inv).is_ok());

        let err = CommandOutput::failure(2, "boom").into_result(&inv).unwrap_err();
        match err {
            NexusError::CommandFailed {
                command, exit_code, ..
            } => {
                assert_eq!(command, "npm run");
                assert_eq!(exit_code, Some(2));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let temp = tempfile::TempDir::new().unwrap();
        let inv = Invocation::new("definitely-not-a-real-binary-mp-nexus", temp.path());
        let err = SystemRunner::new().run(&inv).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "command not found: definitely-not-a-real-binary-mp-nexus"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_captures_output_and_env() {
        let temp = tempfile::TempDir::new().unwrap();
        let inv = Invocation::new("sh", temp.path())
            .args(["-c", "echo $NEXUS_PROBE; echo err >&2; exit 3"])
            .env("NEXUS_PROBE", "hello");
        let out = SystemRunner::new().run(&inv).await.unwrap();
        assert_eq!(out.status, Some(3));
        assert_eq!(out.stdout.trim(), "hello");
        assert_eq!(out.stderr.trim(), "err");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_is_build_timeout() {
        let temp = tempfile::TempDir::new().unwrap();
        let inv = Invocation::new("sleep", temp.path())
            .arg("5")
            .with_timeout(Some(Duration::from_millis(100)));
        let err = SystemRunner::new().run(&inv).await.unwrap_err();
        assert_eq!(err.known_kind(), Some(ErrorKind::BuildTimeout));
    }
}

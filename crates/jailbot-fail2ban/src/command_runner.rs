//! External command execution seam shared by every jail operation.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
/// One external program invocation as an explicit argv.
pub struct CommandInvocation {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandInvocation {
    pub fn new<P, I, S>(program: P, args: I) -> Self
    where
        P: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Renders the argv joined by spaces, for logs and assertions.
    pub fn display(&self) -> String {
        let mut rendered = self.program.clone();
        for arg in &self.args {
            rendered.push(' ');
            rendered.push_str(arg);
        }
        rendered
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Captured result of a finished invocation.
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn stdout_text(&self) -> &str {
        self.stdout.as_str()
    }
}

#[derive(Debug, Error)]
pub enum CommandRunError {
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("'{program}' did not finish within {timeout_ms}ms")]
    Timeout { program: String, timeout_ms: u64 },
    #[error("failed to collect output of '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

#[async_trait]
/// Trait contract for `CommandRunner` behavior.
pub trait CommandRunner: Send + Sync {
    async fn run(&self, invocation: &CommandInvocation) -> Result<CommandOutput, CommandRunError>;
}

#[derive(Debug, Clone, Default)]
/// Runs invocations as child processes, never through a shell.
pub struct ProcessCommandRunner {
    timeout: Option<Duration>,
}

impl ProcessCommandRunner {
    /// A zero `timeout_ms` disables the limit.
    pub fn new(timeout_ms: u64) -> Self {
        let timeout = (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms));
        Self { timeout }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

#[async_trait]
impl CommandRunner for ProcessCommandRunner {
    async fn run(&self, invocation: &CommandInvocation) -> Result<CommandOutput, CommandRunError> {
        let mut command = tokio::process::Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        let child = command.spawn().map_err(|source| CommandRunError::Spawn {
            program: invocation.program.clone(),
            source,
        })?;

        tracing::debug!(command = %invocation.display(), "running external command");
        let output = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, child.wait_with_output())
                .await
                .map_err(|_| CommandRunError::Timeout {
                    program: invocation.program.clone(),
                    timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                })?,
            None => child.wait_with_output().await,
        }
        .map_err(|source| CommandRunError::Wait {
            program: invocation.program.clone(),
            source,
        })?;

        Ok(CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::{CommandInvocation, CommandRunError, CommandRunner, ProcessCommandRunner};

    #[test]
    fn unit_display_joins_program_and_args() {
        let invocation = CommandInvocation::new("sudo", ["fail2ban-client", "unban", "10.0.0.5"]);
        assert_eq!(invocation.display(), "sudo fail2ban-client unban 10.0.0.5");
    }

    #[test]
    fn unit_zero_timeout_disables_limit() {
        assert!(ProcessCommandRunner::new(0).timeout().is_none());
        assert!(ProcessCommandRunner::new(250).timeout().is_some());
    }

    #[tokio::test]
    async fn functional_process_runner_captures_stdout_and_exit_code() {
        let runner = ProcessCommandRunner::new(5_000);
        let output = runner
            .run(&CommandInvocation::new("sh", ["-c", "printf 1; exit 3"]))
            .await
            .expect("sh should run");
        assert_eq!(output.stdout, "1");
        assert_eq!(output.exit_code, Some(3));
        assert!(!output.success());
    }

    #[tokio::test]
    async fn functional_process_runner_passes_arguments_without_shell_expansion() {
        let runner = ProcessCommandRunner::new(5_000);
        let output = runner
            .run(&CommandInvocation::new("echo", ["sshd;", "$(id)"]))
            .await
            .expect("echo should run");
        assert_eq!(output.stdout.trim_end(), "sshd; $(id)");
        assert!(output.success());
    }

    #[tokio::test]
    async fn regression_missing_program_reports_spawn_error() {
        let runner = ProcessCommandRunner::default();
        let error = runner
            .run(&CommandInvocation::new(
                "jailbot-definitely-missing-binary",
                Vec::<String>::new(),
            ))
            .await
            .expect_err("missing binary must fail");
        assert!(matches!(error, CommandRunError::Spawn { .. }));
    }

    #[tokio::test]
    async fn regression_hung_command_times_out() {
        let runner = ProcessCommandRunner::new(100);
        let error = runner
            .run(&CommandInvocation::new("sleep", ["5"]))
            .await
            .expect_err("sleep must time out");
        assert!(matches!(
            error,
            CommandRunError::Timeout {
                timeout_ms: 100,
                ..
            }
        ));
    }
}

//! Invocation templates for `fail2ban-client` and the client that runs them.

use std::sync::Arc;

use crate::command_outcome::{classify_command_outcome, CommandOutcome, SuccessDetection};
use crate::command_runner::{CommandInvocation, CommandOutput, CommandRunError, CommandRunner};
use crate::status_parser::{
    is_legacy_status_format, parse_legacy_jail_banned_ips, parse_legacy_jail_list,
    JailStatusSnapshot, StatusParseError,
};

pub const DEFAULT_FAIL2BAN_CLIENT_PROGRAM: &str = "fail2ban-client";
pub const DEFAULT_SUDO_PROGRAM: &str = "sudo";
pub const DEFAULT_SERVICE_RESTART_COMMAND: [&str; 2] = ["/etc/init.d/fail2ban", "restart"];

#[derive(Debug, Clone, PartialEq, Eq)]
/// Public struct `Fail2banClientConfig` used across jailbot components.
pub struct Fail2banClientConfig {
    pub client_program: String,
    pub use_sudo: bool,
    pub sudo_program: String,
    pub service_restart_command: Vec<String>,
}

impl Default for Fail2banClientConfig {
    fn default() -> Self {
        Self {
            client_program: DEFAULT_FAIL2BAN_CLIENT_PROGRAM.to_string(),
            use_sudo: true,
            sudo_program: DEFAULT_SUDO_PROGRAM.to_string(),
            service_restart_command: DEFAULT_SERVICE_RESTART_COMMAND
                .iter()
                .map(|part| part.to_string())
                .collect(),
        }
    }
}

fn privileged_invocation(config: &Fail2banClientConfig, argv: Vec<String>) -> CommandInvocation {
    if config.use_sudo {
        CommandInvocation::new(config.sudo_program.clone(), argv)
    } else {
        let mut argv = argv.into_iter();
        let program = argv.next().unwrap_or_default();
        CommandInvocation::new(program, argv)
    }
}

fn client_invocation(config: &Fail2banClientConfig, args: &[&str]) -> CommandInvocation {
    let mut argv = Vec::with_capacity(args.len() + 1);
    argv.push(config.client_program.clone());
    argv.extend(args.iter().map(|arg| arg.to_string()));
    privileged_invocation(config, argv)
}

pub fn build_ban_ip_invocation(
    config: &Fail2banClientConfig,
    jail: &str,
    ip: &str,
) -> CommandInvocation {
    client_invocation(config, &["set", jail, "banip", ip])
}

pub fn build_unban_ip_invocation(config: &Fail2banClientConfig, ip: &str) -> CommandInvocation {
    client_invocation(config, &["unban", ip])
}

pub fn build_reload_jail_invocation(
    config: &Fail2banClientConfig,
    jail: &str,
) -> CommandInvocation {
    client_invocation(config, &["reload", "--unban", jail])
}

pub fn build_status_invocation(config: &Fail2banClientConfig) -> CommandInvocation {
    client_invocation(config, &["status"])
}

pub fn build_jail_status_invocation(
    config: &Fail2banClientConfig,
    jail: &str,
) -> CommandInvocation {
    client_invocation(config, &["status", jail])
}

pub fn build_start_jail_invocation(config: &Fail2banClientConfig, jail: &str) -> CommandInvocation {
    client_invocation(config, &["start", jail])
}

pub fn build_stop_jail_invocation(config: &Fail2banClientConfig, jail: &str) -> CommandInvocation {
    client_invocation(config, &["stop", jail])
}

/// `-V` is an unprivileged query and never goes through sudo.
pub fn build_version_invocation(config: &Fail2banClientConfig) -> CommandInvocation {
    CommandInvocation::new(config.client_program.clone(), ["-V"])
}

pub fn build_banned_invocation(config: &Fail2banClientConfig) -> CommandInvocation {
    client_invocation(config, &["banned"])
}

pub fn build_service_restart_invocation(config: &Fail2banClientConfig) -> CommandInvocation {
    privileged_invocation(config, config.service_restart_command.clone())
}

#[derive(Debug, thiserror::Error)]
pub enum BannedReportError {
    #[error(transparent)]
    Command(#[from] CommandRunError),
    #[error(transparent)]
    Parse(#[from] StatusParseError),
    #[error("'{command}' failed (exit_code={exit_code:?}): {stderr}")]
    Failed {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Result of a `/banned` query, shaped by the installed fail2ban version.
pub enum BannedReport {
    /// Legacy per-jail follow-up queries parsed into a snapshot.
    Legacy(JailStatusSnapshot),
    /// Raw output of the aggregate `banned` command.
    Aggregate(String),
}

#[derive(Clone)]
/// Runs fail2ban-client operations through a [`CommandRunner`].
pub struct Fail2banClient {
    config: Fail2banClientConfig,
    runner: Arc<dyn CommandRunner>,
}

impl std::fmt::Debug for Fail2banClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fail2banClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Fail2banClient {
    pub fn new(config: Fail2banClientConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self { config, runner }
    }

    pub fn config(&self) -> &Fail2banClientConfig {
        &self.config
    }

    async fn run(&self, invocation: CommandInvocation) -> Result<CommandOutput, CommandRunError> {
        let output = self.runner.run(&invocation).await?;
        tracing::debug!(
            command = %invocation.display(),
            exit_code = ?output.exit_code,
            "fail2ban command finished"
        );
        Ok(output)
    }

    pub async fn ban_ip(&self, jail: &str, ip: &str) -> Result<CommandOutput, CommandRunError> {
        self.run(build_ban_ip_invocation(&self.config, jail, ip))
            .await
    }

    pub async fn unban_ip(&self, ip: &str) -> Result<CommandOutput, CommandRunError> {
        self.run(build_unban_ip_invocation(&self.config, ip)).await
    }

    pub async fn reload_jail(&self, jail: &str) -> Result<CommandOutput, CommandRunError> {
        self.run(build_reload_jail_invocation(&self.config, jail))
            .await
    }

    pub async fn status(&self) -> Result<CommandOutput, CommandRunError> {
        self.run(build_status_invocation(&self.config)).await
    }

    pub async fn jail_status(&self, jail: &str) -> Result<CommandOutput, CommandRunError> {
        self.run(build_jail_status_invocation(&self.config, jail))
            .await
    }

    pub async fn start_jail(&self, jail: &str) -> Result<CommandOutput, CommandRunError> {
        self.run(build_start_jail_invocation(&self.config, jail))
            .await
    }

    pub async fn stop_jail(&self, jail: &str) -> Result<CommandOutput, CommandRunError> {
        self.run(build_stop_jail_invocation(&self.config, jail))
            .await
    }

    pub async fn version(&self) -> Result<CommandOutput, CommandRunError> {
        self.run(build_version_invocation(&self.config)).await
    }

    pub async fn banned(&self) -> Result<CommandOutput, CommandRunError> {
        self.run(build_banned_invocation(&self.config)).await
    }

    pub async fn restart_service(&self) -> Result<CommandOutput, CommandRunError> {
        self.run(build_service_restart_invocation(&self.config))
            .await
    }

    /// Queries banned addresses fresh from fail2ban. Major version `0` needs
    /// one `status <jail>` call per jail; newer versions answer `banned`
    /// directly. Any call judged failed by `detection` aborts the report.
    pub async fn banned_report(
        &self,
        detection: SuccessDetection,
    ) -> Result<BannedReport, BannedReportError> {
        let version = self
            .run_checked(build_version_invocation(&self.config), detection)
            .await?;
        if !is_legacy_status_format(version.stdout_text()) {
            let banned = self
                .run_checked(build_banned_invocation(&self.config), detection)
                .await?;
            return Ok(BannedReport::Aggregate(banned.stdout));
        }

        let status = self
            .run_checked(build_status_invocation(&self.config), detection)
            .await?;
        let jails = parse_legacy_jail_list(status.stdout_text())?;
        let mut snapshot = JailStatusSnapshot::default();
        for jail in jails {
            let jail_status = self
                .run_checked(build_jail_status_invocation(&self.config, &jail), detection)
                .await?;
            let banned_ips = parse_legacy_jail_banned_ips(jail_status.stdout_text());
            snapshot.push(jail, banned_ips);
        }
        Ok(BannedReport::Legacy(snapshot))
    }

    async fn run_checked(
        &self,
        invocation: CommandInvocation,
        detection: SuccessDetection,
    ) -> Result<CommandOutput, BannedReportError> {
        let command = invocation.display();
        let output = self.run(invocation).await?;
        match classify_command_outcome(&output, detection) {
            CommandOutcome::Succeeded => Ok(output),
            CommandOutcome::Failed => Err(BannedReportError::Failed {
                command,
                exit_code: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            }),
        }
    }
}

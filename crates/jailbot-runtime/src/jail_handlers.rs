//! Handlers for the jail-control commands.
//!
//! Every handler validates its arguments before touching fail2ban; guidance
//! replies never invoke the external tool.

use anyhow::Result;
use jailbot_fail2ban::{
    classify_command_outcome, validate_ip_address, validate_jail_name, BannedReport,
    BannedReportError, CommandOutcome, CommandOutput, CommandRunError,
};

use crate::bot_command::{BotCommand, BotCommandKind};
use crate::bot_reply::{BotReply, ReplySink};
use crate::command_router::CommandRouter;

pub(crate) const RELOAD_CONFIRMATION_TOKEN: &str = "continue";
pub(crate) const NO_BANNED_IPS_REPLY: &str = "There are currently no banned IPs";
pub(crate) const BANNED_QUERY_FAILED_REPLY: &str = "=> fail2ban-client banned query failed";

struct OutcomeReplies<'a> {
    operation: &'a str,
    succeeded: &'a str,
    failed: &'a str,
}

impl CommandRouter {
    pub(crate) async fn handle_ban(&self, command: &BotCommand, sink: &dyn ReplySink) -> Result<()> {
        let Some(raw_ip) = command.arg(0) else {
            return sink.send(BotReply::plain("Please, specify an IP")).await;
        };
        let Some(ip) = validate_ip_address(raw_ip) else {
            return sink.send(BotReply::plain("Invalid IP")).await;
        };
        let Some(raw_jail) = command.arg(1) else {
            return self
                .prompt_for_jail(
                    BotCommandKind::Ban,
                    "Please, specify a jail for the ban.",
                    Some(raw_ip),
                    sink,
                )
                .await;
        };
        let Ok(jail) = validate_jail_name(raw_jail) else {
            return sink.send(BotReply::plain("Invalid jail name")).await;
        };

        let ip = ip.to_string();
        sink.send(BotReply::plain(format!("BAN : {ip}"))).await?;
        let result = self.fail2ban().ban_ip(jail, &ip).await;
        self.report_outcome(
            result,
            OutcomeReplies {
                operation: "ban",
                succeeded: "=> IP banned",
                failed: "=> IP not banned",
            },
            sink,
        )
        .await
    }

    pub(crate) async fn handle_unban(
        &self,
        command: &BotCommand,
        sink: &dyn ReplySink,
    ) -> Result<()> {
        let Some(raw_ip) = command.arg(0) else {
            return sink.send(BotReply::plain("Please, specify an IP")).await;
        };
        let Some(ip) = validate_ip_address(raw_ip) else {
            return sink.send(BotReply::plain("Invalid IP")).await;
        };

        let ip = ip.to_string();
        sink.send(BotReply::plain(format!("Unbanning : {ip}"))).await?;
        let result = self.fail2ban().unban_ip(&ip).await;
        self.report_outcome(
            result,
            OutcomeReplies {
                operation: "unban",
                succeeded: "=> IP unbanned",
                failed: "=> IP not unbanned",
            },
            sink,
        )
        .await
    }

    pub(crate) async fn handle_reload(
        &self,
        command: &BotCommand,
        sink: &dyn ReplySink,
    ) -> Result<()> {
        let Some(raw_jail) = command.arg(0) else {
            return self
                .prompt_for_jail(BotCommandKind::Reload, "Please, specify a jail", None, sink)
                .await;
        };
        let Ok(jail) = validate_jail_name(raw_jail) else {
            return sink.send(BotReply::plain("Invalid jail name")).await;
        };
        if command.arg(1) != Some(RELOAD_CONFIRMATION_TOKEN) {
            return sink
                .send(BotReply::plain(format!(
                    "ATTENTION: this action will reset the jail and remove all IPs from it.\n\
                     To continue, send:\n\n/reload {jail} {RELOAD_CONFIRMATION_TOKEN}"
                )))
                .await;
        }

        sink.send(BotReply::plain(format!("Reloading jail : {jail}")))
            .await?;
        let result = self.fail2ban().reload_jail(jail).await;
        self.report_outcome(
            result,
            OutcomeReplies {
                operation: "reload",
                succeeded: "=> Jail reloaded",
                failed: "=> Jail not reloaded",
            },
            sink,
        )
        .await
    }

    pub(crate) async fn handle_banned(&self, sink: &dyn ReplySink) -> Result<()> {
        let detection = self.config().success_detection;
        let report = match self.fail2ban().banned_report(detection).await {
            Ok(report) => report,
            Err(BannedReportError::Command(error)) => {
                return self.report_invocation_error("banned", &error, sink).await;
            }
            Err(error @ BannedReportError::Failed { .. }) => {
                tracing::error!(%error, "fail2ban banned query failed");
                return sink
                    .send(BotReply::plain(BANNED_QUERY_FAILED_REPLY))
                    .await;
            }
            Err(BannedReportError::Parse(error)) => {
                tracing::error!(%error, "failed to parse fail2ban status output");
                return sink
                    .send(BotReply::plain("Could not parse fail2ban status output"))
                    .await;
            }
        };

        match report {
            BannedReport::Legacy(snapshot) => {
                let mut replied = false;
                for entry in snapshot.jails_with_bans() {
                    sink.send(BotReply::plain(format!(
                        "{} banned IPs: {}",
                        entry.jail,
                        entry.render_ip_list()
                    )))
                    .await?;
                    replied = true;
                }
                if !replied {
                    sink.send(BotReply::plain(NO_BANNED_IPS_REPLY)).await?;
                }
            }
            BannedReport::Aggregate(raw) => {
                let raw = raw.trim_end();
                if raw.trim().is_empty() {
                    sink.send(BotReply::plain(NO_BANNED_IPS_REPLY)).await?;
                } else {
                    sink.send(BotReply::plain(raw)).await?;
                }
            }
        }
        Ok(())
    }

    pub(crate) async fn handle_start_jail(
        &self,
        command: &BotCommand,
        sink: &dyn ReplySink,
    ) -> Result<()> {
        let Some(raw_jail) = command.arg(0) else {
            return self
                .prompt_for_jail(BotCommandKind::StartJail, "Please, specify a jail", None, sink)
                .await;
        };
        let Ok(jail) = validate_jail_name(raw_jail) else {
            return sink.send(BotReply::plain("Invalid jail name")).await;
        };

        sink.send(BotReply::plain(format!("Starting jail : {jail}")))
            .await?;
        let result = self.fail2ban().start_jail(jail).await;
        self.restart_service(sink).await?;
        self.report_outcome(
            result,
            OutcomeReplies {
                operation: "start_jail",
                succeeded: "=> Jail started",
                failed: "=> Jail not started",
            },
            sink,
        )
        .await
    }

    pub(crate) async fn handle_stop_jail(
        &self,
        command: &BotCommand,
        sink: &dyn ReplySink,
    ) -> Result<()> {
        let Some(raw_jail) = command.arg(0) else {
            return self
                .prompt_for_jail(BotCommandKind::StopJail, "Please, specify a jail", None, sink)
                .await;
        };
        let Ok(jail) = validate_jail_name(raw_jail) else {
            return sink.send(BotReply::plain("Invalid jail name")).await;
        };

        sink.send(BotReply::plain(format!("Stopping jail : {jail}")))
            .await?;
        let result = self.fail2ban().stop_jail(jail).await;
        self.restart_service(sink).await?;
        self.report_outcome(
            result,
            OutcomeReplies {
                operation: "stop_jail",
                succeeded: "=> Jail stopped",
                failed: "=> Jail not stopped",
            },
            sink,
        )
        .await
    }

    /// Asks for the missing jail argument. With a default jail configured the
    /// prompt is followed by a ready-to-send command using it.
    async fn prompt_for_jail(
        &self,
        kind: BotCommandKind,
        prompt: &str,
        leading_arg: Option<&str>,
        sink: &dyn ReplySink,
    ) -> Result<()> {
        let Some(default_jail) = self.config().default_ban_jail.as_deref() else {
            return sink.send(BotReply::plain(prompt)).await;
        };
        sink.send(BotReply::plain(format!(
            "{prompt}\nIf you want to use the default jail '{default_jail}', send:"
        )))
        .await?;
        let suggestion = match leading_arg {
            Some(arg) => format!("/{} {arg} {default_jail}", kind.name()),
            None => format!("/{} {default_jail}", kind.name()),
        };
        sink.send(BotReply::plain(suggestion)).await
    }

    /// The restart always runs after start/stop; its result does not change
    /// the start/stop outcome reply.
    async fn restart_service(&self, sink: &dyn ReplySink) -> Result<()> {
        let detection = self.config().success_detection;
        let failure = match self.fail2ban().restart_service().await {
            Ok(output) => match classify_command_outcome(&output, detection) {
                CommandOutcome::Succeeded => return Ok(()),
                CommandOutcome::Failed => format!(
                    "exit_code={:?} stderr={}",
                    output.exit_code,
                    output.stderr.trim()
                ),
            },
            Err(error) => error.to_string(),
        };
        tracing::warn!(detail = %failure, "fail2ban service restart failed");
        sink.send(BotReply::plain("=> fail2ban service restart failed"))
            .await
    }

    async fn report_outcome(
        &self,
        result: Result<CommandOutput, CommandRunError>,
        replies: OutcomeReplies<'_>,
        sink: &dyn ReplySink,
    ) -> Result<()> {
        let output = match result {
            Ok(output) => output,
            Err(error) => {
                return self
                    .report_invocation_error(replies.operation, &error, sink)
                    .await;
            }
        };
        let outcome = classify_command_outcome(&output, self.config().success_detection);
        tracing::info!(
            operation = replies.operation,
            outcome = outcome.as_str(),
            exit_code = ?output.exit_code,
            "fail2ban command completed"
        );
        let text = if outcome.is_success() {
            replies.succeeded
        } else {
            replies.failed
        };
        sink.send(BotReply::plain(text)).await
    }

    async fn report_invocation_error(
        &self,
        operation: &str,
        error: &CommandRunError,
        sink: &dyn ReplySink,
    ) -> Result<()> {
        tracing::error!(operation, %error, "fail2ban-client invocation failed");
        sink.send(BotReply::plain(format!(
            "=> fail2ban-client invocation failed: {error}"
        )))
        .await
    }
}

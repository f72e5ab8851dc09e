//! Resolution of parsed CLI flags into the immutable runtime configuration.

use anyhow::{anyhow, bail, Result};
use jailbot_access::AuthorizedIdentitySet;
use jailbot_fail2ban::{validate_jail_name, Fail2banClientConfig};
use jailbot_runtime::{BotConfig, BotRuntimeConfig};
use jailbot_telegram::TelegramApiConfig;

use crate::Cli;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Everything the binary needs to wire the bot, resolved once at startup.
pub struct BotSettings {
    pub bot: BotConfig,
    pub fail2ban: Fail2banClientConfig,
    pub telegram: TelegramApiConfig,
    pub runtime: BotRuntimeConfig,
    pub command_timeout_ms: u64,
}

impl Cli {
    pub fn into_bot_settings(self) -> Result<BotSettings> {
        let bot_token = self.telegram_bot_token.trim().to_string();
        if bot_token.is_empty() {
            bail!("--telegram-bot-token cannot be empty");
        }

        let default_ban_jail = match self.default_ban_jail.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => {
                let jail = validate_jail_name(raw)
                    .map_err(|error| anyhow!("invalid --default-ban-jail '{raw}': {error}"))?;
                Some(jail.to_string())
            }
        };

        let service_restart_command = parse_service_restart_command(&self.service_restart_command)?;

        let fail2ban_client = self.fail2ban_client.trim().to_string();
        if fail2ban_client.is_empty() {
            bail!("--fail2ban-client cannot be empty");
        }
        let sudo_program = self.sudo_program.trim().to_string();
        if !self.no_sudo && sudo_program.is_empty() {
            bail!("--sudo-program cannot be empty unless --no-sudo is set");
        }

        Ok(BotSettings {
            bot: BotConfig {
                authorized_users: AuthorizedIdentitySet::parse(&self.authorized_users),
                default_ban_jail,
                command_surface: self.command_surface.into(),
                success_detection: self.success_detection.into(),
            },
            fail2ban: Fail2banClientConfig {
                client_program: fail2ban_client,
                use_sudo: !self.no_sudo,
                sudo_program,
                service_restart_command,
            },
            telegram: TelegramApiConfig {
                api_base: self.telegram_api_base.trim().to_string(),
                bot_token,
                request_timeout_ms: self.telegram_request_timeout_ms,
                poll_timeout_seconds: self.telegram_poll_timeout_seconds,
                retry_max_attempts: self.telegram_retry_max_attempts,
                retry_base_delay_ms: self.telegram_retry_base_delay_ms,
            },
            runtime: BotRuntimeConfig {
                poll_once: self.poll_once,
                idle_backoff_ms: self.poll_idle_backoff_ms,
            },
            command_timeout_ms: self.command_timeout_ms,
        })
    }
}

/// Splits a shell-style command line into argv without invoking a shell.
pub fn parse_service_restart_command(raw: &str) -> Result<Vec<String>> {
    let argv = shell_words::split(raw)
        .map_err(|error| anyhow!("invalid --service-restart-command: {error}"))?;
    if argv.is_empty() {
        bail!("--service-restart-command cannot be empty");
    }
    Ok(argv)
}

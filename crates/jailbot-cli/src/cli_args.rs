use clap::{ArgAction, Parser};

use jailbot_fail2ban::{DEFAULT_FAIL2BAN_CLIENT_PROGRAM, DEFAULT_SUDO_PROGRAM};
use jailbot_runtime::DEFAULT_IDLE_BACKOFF_MS;
use jailbot_telegram::DEFAULT_TELEGRAM_API_BASE;

use crate::{CliCommandSurface, CliSuccessDetection};

pub const DEFAULT_SERVICE_RESTART_COMMAND_LINE: &str = "/etc/init.d/fail2ban restart";

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_positive_usize(value: &str) -> Result<usize, String> {
    let parsed = value
        .parse::<usize>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Parser)]
#[command(
    name = "jailbot",
    about = "Telegram bot for operating fail2ban jails from a chat",
    version
)]
/// Public struct `Cli` used across jailbot components.
pub struct Cli {
    #[arg(
        long = "telegram-bot-token",
        env = "JAILBOT_TELEGRAM_BOT_TOKEN",
        hide_env_values = true,
        help = "Telegram Bot API token"
    )]
    pub telegram_bot_token: String,

    #[arg(
        long = "authorized-users",
        env = "JAILBOT_AUTHORIZED_USERS",
        default_value = "",
        help = "Comma-separated Telegram user ids allowed to issue commands. Empty denies everyone."
    )]
    pub authorized_users: String,

    #[arg(
        long = "default-ban-jail",
        env = "JAILBOT_DEFAULT_BAN_JAIL",
        help = "Jail suggested when a command omits its jail argument"
    )]
    pub default_ban_jail: Option<String>,

    #[arg(
        long = "command-surface",
        env = "JAILBOT_COMMAND_SURFACE",
        value_enum,
        default_value_t = CliCommandSurface::Full,
        help = "Command set exposed in chat: full jail control or unban/banned only"
    )]
    pub command_surface: CliCommandSurface,

    #[arg(
        long = "success-detection",
        env = "JAILBOT_SUCCESS_DETECTION",
        value_enum,
        default_value_t = CliSuccessDetection::ExitStatus,
        help = "How fail2ban-client results are judged: process exit status, or legacy '0' stdout literal"
    )]
    pub success_detection: CliSuccessDetection,

    #[arg(
        long = "fail2ban-client",
        env = "JAILBOT_FAIL2BAN_CLIENT",
        default_value = DEFAULT_FAIL2BAN_CLIENT_PROGRAM,
        help = "fail2ban-client executable path"
    )]
    pub fail2ban_client: String,

    #[arg(
        long = "no-sudo",
        env = "JAILBOT_NO_SUDO",
        action = ArgAction::SetTrue,
        help = "Run fail2ban-client and the service restart directly instead of through sudo"
    )]
    pub no_sudo: bool,

    #[arg(
        long = "sudo-program",
        env = "JAILBOT_SUDO_PROGRAM",
        default_value = DEFAULT_SUDO_PROGRAM,
        help = "Privilege escalation program prefixed to privileged commands"
    )]
    pub sudo_program: String,

    #[arg(
        long = "service-restart-command",
        env = "JAILBOT_SERVICE_RESTART_COMMAND",
        default_value = DEFAULT_SERVICE_RESTART_COMMAND_LINE,
        help = "Command line run after /start_jail and /stop_jail to restart the fail2ban service"
    )]
    pub service_restart_command: String,

    #[arg(
        long = "command-timeout-ms",
        env = "JAILBOT_COMMAND_TIMEOUT_MS",
        default_value_t = 60_000,
        help = "Timeout in milliseconds for each external command. 0 disables the timeout."
    )]
    pub command_timeout_ms: u64,

    #[arg(
        long = "telegram-api-base",
        env = "JAILBOT_TELEGRAM_API_BASE",
        default_value = DEFAULT_TELEGRAM_API_BASE,
        help = "Telegram Bot API base URL"
    )]
    pub telegram_api_base: String,

    #[arg(
        long = "telegram-poll-timeout-seconds",
        env = "JAILBOT_TELEGRAM_POLL_TIMEOUT_SECONDS",
        default_value_t = 30,
        help = "Long-poll timeout in seconds passed to getUpdates"
    )]
    pub telegram_poll_timeout_seconds: u64,

    #[arg(
        long = "telegram-request-timeout-ms",
        env = "JAILBOT_TELEGRAM_REQUEST_TIMEOUT_MS",
        default_value_t = 10_000,
        value_parser = parse_positive_u64,
        help = "HTTP timeout in milliseconds added on top of the long-poll window"
    )]
    pub telegram_request_timeout_ms: u64,

    #[arg(
        long = "telegram-retry-max-attempts",
        env = "JAILBOT_TELEGRAM_RETRY_MAX_ATTEMPTS",
        default_value_t = 3,
        value_parser = parse_positive_usize,
        help = "Maximum attempts for retryable Telegram API failures"
    )]
    pub telegram_retry_max_attempts: usize,

    #[arg(
        long = "telegram-retry-base-delay-ms",
        env = "JAILBOT_TELEGRAM_RETRY_BASE_DELAY_MS",
        default_value_t = 500,
        help = "Base backoff delay in milliseconds for Telegram API retries"
    )]
    pub telegram_retry_base_delay_ms: u64,

    #[arg(
        long = "poll-idle-backoff-ms",
        env = "JAILBOT_POLL_IDLE_BACKOFF_MS",
        default_value_t = DEFAULT_IDLE_BACKOFF_MS,
        help = "Delay in milliseconds before polling again after a getUpdates failure"
    )]
    pub poll_idle_backoff_ms: u64,

    #[arg(
        long = "poll-once",
        action = ArgAction::SetTrue,
        help = "Process one getUpdates batch, wait for its replies and exit"
    )]
    pub poll_once: bool,
}

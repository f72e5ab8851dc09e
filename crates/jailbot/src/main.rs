mod bootstrap_helpers;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use jailbot_cli::{BotSettings, Cli};
use jailbot_fail2ban::{Fail2banClient, ProcessCommandRunner};
use jailbot_runtime::{run_bot_polling_loop, CommandRouter};
use jailbot_telegram::TelegramApiClient;

use crate::bootstrap_helpers::init_tracing;

async fn run_bot(settings: BotSettings) -> Result<()> {
    let BotSettings {
        bot,
        fail2ban,
        telegram,
        runtime,
        command_timeout_ms,
    } = settings;

    if bot.authorized_users.is_empty() {
        tracing::warn!("authorized user list is empty; every chat command will be rejected");
    }
    tracing::info!(
        authorized_users = bot.authorized_users.len(),
        command_surface = bot.command_surface.as_str(),
        success_detection = bot.success_detection.as_str(),
        use_sudo = fail2ban.use_sudo,
        command_timeout_ms,
        "starting jailbot"
    );

    let runner = Arc::new(ProcessCommandRunner::new(command_timeout_ms));
    let router = Arc::new(CommandRouter::new(
        Arc::new(bot),
        Fail2banClient::new(fail2ban, runner),
    ));
    let telegram =
        Arc::new(TelegramApiClient::new(telegram).context("failed to initialize telegram client")?);

    let shutdown = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };
    run_bot_polling_loop(runtime, telegram, router, shutdown).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let settings = Cli::parse().into_bot_settings()?;
    run_bot(settings).await
}

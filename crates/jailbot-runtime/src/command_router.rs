//! Allow-list gate and command dispatch for inbound chat messages.

use std::sync::Arc;

use anyhow::Result;
use jailbot_access::evaluate_access;
use jailbot_fail2ban::Fail2banClient;
use jailbot_telegram::{render_user_mention_html, InboundChatMessage};

use crate::bot_command::{parse_chat_input, BotCommand, BotCommandKind, ChatInput};
use crate::bot_config::BotConfig;
use crate::bot_reply::{BotReply, ReplySink};

#[derive(Debug, Clone)]
/// Routes one chat message at a time; holds no mutable state, so a single
/// instance is shared by every message task.
pub struct CommandRouter {
    config: Arc<BotConfig>,
    fail2ban: Fail2banClient,
}

impl CommandRouter {
    pub fn new(config: Arc<BotConfig>, fail2ban: Fail2banClient) -> Self {
        Self { config, fail2ban }
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub(crate) fn fail2ban(&self) -> &Fail2banClient {
        &self.fail2ban
    }

    pub async fn handle_message(
        &self,
        message: &InboundChatMessage,
        sink: &dyn ReplySink,
    ) -> Result<()> {
        let input = parse_chat_input(&message.text);
        let decision = evaluate_access(&self.config.authorized_users, &message.sender_id);
        if !decision.is_allowed() {
            tracing::warn!(
                sender_id = %message.sender_id,
                chat_id = message.chat_id,
                command = input.label(),
                reason_code = decision.reason_code(),
                "rejected chat command from unauthorized sender"
            );
            let mention = render_user_mention_html(&message.sender_id, &message.sender_display_name);
            return sink
                .send(BotReply::html(format!(
                    "You are not authorized to use this bot, {mention}!"
                )))
                .await;
        }

        let command = match input {
            ChatInput::Text(text) => return self.reply_not_a_command(&text, sink).await,
            ChatInput::Command(command) => command,
        };
        let Some(kind) = BotCommandKind::from_name(&command.name, self.config.command_surface)
        else {
            return self.reply_not_a_command(&command.raw, sink).await;
        };

        tracing::info!(
            sender_id = %message.sender_id,
            chat_id = message.chat_id,
            command = kind.name(),
            args = command.args.len(),
            "dispatching chat command"
        );
        self.dispatch(kind, &command, message, sink).await
    }

    async fn dispatch(
        &self,
        kind: BotCommandKind,
        command: &BotCommand,
        message: &InboundChatMessage,
        sink: &dyn ReplySink,
    ) -> Result<()> {
        match kind {
            BotCommandKind::Start => {
                let mention =
                    render_user_mention_html(&message.sender_id, &message.sender_display_name);
                sink.send(
                    BotReply::html(format!(
                        "Hi {mention}! Send /help to see available commands."
                    ))
                    .with_force_reply(),
                )
                .await
            }
            BotCommandKind::Help => sink.send(BotReply::plain(self.help_text())).await,
            BotCommandKind::Ban => self.handle_ban(command, sink).await,
            BotCommandKind::Unban => self.handle_unban(command, sink).await,
            BotCommandKind::Reload => self.handle_reload(command, sink).await,
            BotCommandKind::Banned => self.handle_banned(sink).await,
            BotCommandKind::StartJail => self.handle_start_jail(command, sink).await,
            BotCommandKind::StopJail => self.handle_stop_jail(command, sink).await,
        }
    }

    pub fn help_text(&self) -> String {
        let surface = self.config.command_surface;
        let intro = if surface.exposes(BotCommandKind::Ban) {
            "This bot is used to ban or unban IPs in Fail2Ban."
        } else {
            "This bot is used to unban IPs in Fail2Ban."
        };
        let mut text = format!("{intro}\n\nCommands:\n");
        for kind in surface.commands() {
            text.push_str(kind.usage());
            text.push('\n');
        }
        text
    }

    async fn reply_not_a_command(&self, text: &str, sink: &dyn ReplySink) -> Result<()> {
        sink.send(BotReply::plain(format!(
            "{text} is not a valid command, use /help to see the valid commands"
        )))
        .await
    }
}

//! Reply model and the sinks that deliver replies to a chat.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use jailbot_telegram::{OutboundChatMessage, TelegramApiClient, TelegramParseMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Enumerates supported `ReplyFormat` values.
pub enum ReplyFormat {
    #[default]
    Plain,
    Html,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One outbound reply produced by a command handler.
pub struct BotReply {
    pub text: String,
    pub format: ReplyFormat,
    pub force_reply: bool,
}

impl BotReply {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: ReplyFormat::Plain,
            force_reply: false,
        }
    }

    pub fn html(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: ReplyFormat::Html,
            force_reply: false,
        }
    }

    pub fn with_force_reply(mut self) -> Self {
        self.force_reply = true;
        self
    }
}

#[async_trait]
/// Trait contract for `ReplySink` behavior.
pub trait ReplySink: Send + Sync {
    async fn send(&self, reply: BotReply) -> Result<()>;
}

/// Delivers replies to one Telegram chat.
pub struct TelegramReplySink {
    client: Arc<TelegramApiClient>,
    chat_id: i64,
}

impl TelegramReplySink {
    pub fn new(client: Arc<TelegramApiClient>, chat_id: i64) -> Self {
        Self { client, chat_id }
    }
}

pub fn outbound_message_for_reply(chat_id: i64, reply: BotReply) -> OutboundChatMessage {
    OutboundChatMessage {
        chat_id,
        text: reply.text,
        parse_mode: match reply.format {
            ReplyFormat::Plain => None,
            ReplyFormat::Html => Some(TelegramParseMode::Html),
        },
        force_reply: reply.force_reply,
    }
}

#[async_trait]
impl ReplySink for TelegramReplySink {
    async fn send(&self, reply: BotReply) -> Result<()> {
        let message = outbound_message_for_reply(self.chat_id, reply);
        self.client
            .send_message(&message)
            .await
            .with_context(|| format!("failed to deliver reply to chat {}", self.chat_id))?;
        Ok(())
    }
}

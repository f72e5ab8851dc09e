//! Bot API update models and their conversion into chat messages.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct TelegramUpdate {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct TelegramMessage {
    pub message_id: i64,
    pub chat: TelegramChat,
    #[serde(default)]
    pub from: Option<TelegramUser>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct TelegramChat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct TelegramUser {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

impl TelegramUser {
    pub fn display_name(&self) -> String {
        let mut name = self.first_name.trim().to_string();
        if let Some(last_name) = self
            .last_name
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            if !name.is_empty() {
                name.push(' ');
            }
            name.push_str(last_name);
        }
        if name.is_empty() {
            if let Some(username) = self.username.as_deref().map(str::trim) {
                name = username.to_string();
            }
        }
        if name.is_empty() {
            name = self.id.to_string();
        }
        name
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A text message addressed to the bot, reduced to what the router needs.
pub struct InboundChatMessage {
    pub update_id: i64,
    pub chat_id: i64,
    pub message_id: i64,
    pub sender_id: String,
    pub sender_display_name: String,
    pub text: String,
}

/// Returns `None` for updates that carry no text message or no sender, such
/// as edits, channel posts or media without caption.
pub fn inbound_message_from_update(update: &TelegramUpdate) -> Option<InboundChatMessage> {
    let message = update.message.as_ref()?;
    let text = message.text.as_deref()?;
    let sender = message.from.as_ref()?;
    Some(InboundChatMessage {
        update_id: update.update_id,
        chat_id: message.chat.id,
        message_id: message.message_id,
        sender_id: sender.id.to_string(),
        sender_display_name: sender.display_name(),
        text: text.to_string(),
    })
}

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// HTML mention link for `parse_mode=HTML` messages.
pub fn render_user_mention_html(user_id: &str, display_name: &str) -> String {
    format!(
        "<a href=\"tg://user?id={}\">{}</a>",
        escape_html(user_id),
        escape_html(display_name)
    )
}

//! Telegram Bot API transport for jailbot.
//!
//! Long-polls `getUpdates`, turns text messages into [`InboundChatMessage`]
//! values and delivers replies through `sendMessage` with chunking and retry.

pub mod telegram_api_client;
pub mod telegram_update;

pub use telegram_api_client::*;
pub use telegram_update::*;

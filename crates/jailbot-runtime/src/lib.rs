//! Command routing and polling runtime for jailbot.
//!
//! Inbound chat messages are authorized against the allow-list, parsed into
//! bot commands and dispatched to jail handlers that drive fail2ban-client.
//! Replies stream back through a [`ReplySink`] as each handler progresses.

pub mod bot_command;
pub mod bot_config;
pub mod bot_reply;
pub mod bot_runtime;
pub mod command_router;
mod jail_handlers;

pub use bot_command::*;
pub use bot_config::*;
pub use bot_reply::*;
pub use bot_runtime::*;
pub use command_router::*;

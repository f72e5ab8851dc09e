//! Chat command parsing and the per-surface command table.

pub const COMMAND_MARKER: char = '/';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Which command set the bot exposes.
pub enum CommandSurface {
    /// Every jail operation.
    #[default]
    Full,
    /// `/start`, `/help`, `/unban` and `/banned` only.
    Reduced,
}

impl CommandSurface {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Reduced => "reduced",
        }
    }

    pub fn commands(self) -> &'static [BotCommandKind] {
        match self {
            Self::Full => &[
                BotCommandKind::Start,
                BotCommandKind::Help,
                BotCommandKind::Ban,
                BotCommandKind::Unban,
                BotCommandKind::Reload,
                BotCommandKind::Banned,
                BotCommandKind::StartJail,
                BotCommandKind::StopJail,
            ],
            Self::Reduced => &[
                BotCommandKind::Start,
                BotCommandKind::Help,
                BotCommandKind::Unban,
                BotCommandKind::Banned,
            ],
        }
    }

    pub fn exposes(self, kind: BotCommandKind) -> bool {
        self.commands().contains(&kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Enumerates supported `BotCommandKind` values.
pub enum BotCommandKind {
    Start,
    Help,
    Ban,
    Unban,
    Reload,
    Banned,
    StartJail,
    StopJail,
}

impl BotCommandKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Help => "help",
            Self::Ban => "ban",
            Self::Unban => "unban",
            Self::Reload => "reload",
            Self::Banned => "banned",
            Self::StartJail => "start_jail",
            Self::StopJail => "stop_jail",
        }
    }

    /// Resolves a case-sensitive command name, honouring the active surface.
    pub fn from_name(name: &str, surface: CommandSurface) -> Option<Self> {
        surface
            .commands()
            .iter()
            .copied()
            .find(|kind| kind.name() == name)
    }

    pub fn usage(self) -> &'static str {
        match self {
            Self::Start => "/start => Start the bot",
            Self::Help => "/help => Show this help message",
            Self::Ban => "/ban IP JAIL => Ban IP in JAIL",
            Self::Unban => "/unban IP => Unban IP",
            Self::Reload => "/reload JAIL => Reload jail and unban all its IP addresses",
            Self::Banned => "/banned => Show banned IPs by jail",
            Self::StartJail => "/start_jail JAIL => Start a specific jail",
            Self::StopJail => "/stop_jail JAIL => Stop a specific jail",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A `/command arg...` message split into name and ordered arguments.
pub struct BotCommand {
    pub name: String,
    pub args: Vec<String>,
    pub raw: String,
}

impl BotCommand {
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Enumerates supported `ChatInput` values.
pub enum ChatInput {
    Command(BotCommand),
    Text(String),
}

impl ChatInput {
    /// Short label for logs.
    pub fn label(&self) -> &str {
        match self {
            Self::Command(command) => command.name.as_str(),
            Self::Text(_) => "text",
        }
    }
}

/// Splits `text` on whitespace. A first token starting with `/` is a command;
/// a `@botname` suffix on it (group chat addressing) is dropped.
pub fn parse_chat_input(text: &str) -> ChatInput {
    let trimmed = text.trim();
    let mut tokens = trimmed.split_whitespace();
    let Some(first) = tokens.next() else {
        return ChatInput::Text(trimmed.to_string());
    };
    let Some(command) = first.strip_prefix(COMMAND_MARKER) else {
        return ChatInput::Text(trimmed.to_string());
    };
    let name = command
        .split_once('@')
        .map(|(name, _)| name)
        .unwrap_or(command);
    ChatInput::Command(BotCommand {
        name: name.to_string(),
        args: tokens.map(str::to_string).collect(),
        raw: trimmed.to_string(),
    })
}

use jailbot_access::AuthorizedIdentitySet;
use jailbot_fail2ban::SuccessDetection;

use crate::bot_command::CommandSurface;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Immutable bot configuration resolved once at startup and shared read-only
/// by every message task.
pub struct BotConfig {
    pub authorized_users: AuthorizedIdentitySet,
    /// Jail suggested when a command omits its jail argument.
    pub default_ban_jail: Option<String>,
    pub command_surface: CommandSurface,
    pub success_detection: SuccessDetection,
}
